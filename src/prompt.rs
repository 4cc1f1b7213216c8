//! Builds the generation prompt: the component vocabulary, the naming
//! rules the model most often gets wrong, and one worked example.

use crate::vocabulary::Vocabulary;

/// Formatted component list, one block per namespace, in registry order.
pub fn component_list(vocabulary: &Vocabulary) -> String {
    let mut out = String::with_capacity(2048);
    for (namespace, symbols) in vocabulary.entries() {
        out.push('\n');
        out.push_str(namespace);
        out.push_str(":\n  Available: ");
        out.push_str(&symbols.join(", "));
    }
    out
}

pub fn build_system_prompt(vocabulary: &Vocabulary) -> String {
    format!(
        r#"You are an expert in creating architecture diagrams using Python's 'diagrams' library.

AVAILABLE COMPONENTS - USE ONLY THESE EXACT NAMES:
{}

CRITICAL RULES:
1. Use ONLY components listed above with EXACT names
2. NEVER use 'EventBridge' - use 'Eventbridge' instead
3. NEVER use 'DynamoDB' - use 'Dynamodb' instead
4. NEVER use 'ElastiCache' - use 'Elasticache' instead
5. NEVER use 'Users' - use 'User' instead
6. Always use show=False in Diagram()
7. Use proper connections: >> (left to right), << (right to left), or - (bidirectional)
8. Use Cluster for grouping related components
9. Set direction parameter: "LR" (left-right), "TB" (top-bottom), "BT", or "RL"

EXAMPLE (FOLLOW THIS EXACT PATTERN):
```python
from diagrams import Diagram, Cluster
from diagrams.aws.compute import Lambda, ECS
from diagrams.aws.database import RDS, Dynamodb, Elasticache
from diagrams.aws.network import CloudFront, APIGateway
from diagrams.aws.integration import SQS, SNS, StepFunctions
from diagrams.onprem.client import User

with Diagram("E-commerce Platform", show=False, direction="LR"):
    customer = User("Customer")

    with Cluster("AWS Cloud"):
        cdn = CloudFront("CDN")
        api = APIGateway("API Gateway")

        with Cluster("Services"):
            auth = Lambda("Auth")
            products = ECS("Products")

        with Cluster("Data"):
            db = Dynamodb("User DB")
            cache = Elasticache("Cache")

        queue = SQS("Queue")
        topic = SNS("Notifications")

    customer >> cdn >> api >> auth
    api >> products >> [db, cache]
    products >> queue >> topic
```

IMPORTANT: If you need event-driven architecture, use 'Eventbridge' (lowercase 'bridge').
If you need step functions, use 'StepFunctions' (camelCase with 's').

Generate ONLY the Python code, no explanations."#,
        component_list(vocabulary)
    )
}

/// The full prompt for one generation call.
pub fn build_generation_prompt(vocabulary: &Vocabulary, description: &str) -> String {
    format!(
        "{}\n\nUser Description:\n{}\n\nGenerate the diagram code:",
        build_system_prompt(vocabulary),
        description
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::Vocabulary;

    #[test]
    fn component_list_covers_every_namespace() {
        let vocab = Vocabulary::builtin();
        let list = component_list(&vocab);
        for (namespace, symbols) in vocab.entries() {
            assert!(list.contains(namespace));
            for symbol in symbols {
                assert!(list.contains(symbol.as_str()));
            }
        }
    }

    #[test]
    fn generation_prompt_embeds_the_description() {
        let vocab = Vocabulary::builtin();
        let prompt = build_generation_prompt(&vocab, "three-tier web app on AWS");
        assert!(prompt.contains("User Description:\nthree-tier web app on AWS"));
        assert!(prompt.contains("USE ONLY THESE EXACT NAMES"));
        assert!(prompt.ends_with("Generate the diagram code:"));
    }
}
