//! Static correction tables applied to raw generated text before any
//! symbol-level analysis: exact-substring fixes first, regex typo-class
//! fixes second.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy)]
pub struct LiteralFix {
    pub find: &'static str,
    pub replace: &'static str,
}

/// Known bad spelling -> good spelling, applied in table order.
///
/// Ordering constraint: `StepFunction -> StepFunctions` re-fires on text
/// that is already correct, so the `StepFunctionss` entry must come after
/// it to collapse the doubled suffix again. Any reordering must keep the
/// table confluent.
pub const LITERAL_FIXES: &[LiteralFix] = &[
    LiteralFix {
        find: "DynamoDB",
        replace: "Dynamodb",
    },
    LiteralFix {
        find: "ElastiCache",
        replace: "Elasticache",
    },
    LiteralFix {
        find: "EventBridge",
        replace: "Eventbridge",
    },
    LiteralFix {
        find: "StepFunction",
        replace: "StepFunctions",
    },
    LiteralFix {
        find: "StepFunctionss",
        replace: "StepFunctions",
    },
    LiteralFix {
        find: "Users",
        replace: "User",
    },
    LiteralFix {
        find: "Clients",
        replace: "Client",
    },
    LiteralFix {
        find: "Api_Gateway",
        replace: "APIGateway",
    },
    LiteralFix {
        find: "ApiGateway",
        replace: "APIGateway",
    },
    LiteralFix {
        find: "ElasticCache",
        replace: "Elasticache",
    },
    LiteralFix {
        find: "DynamoDb",
        replace: "Dynamodb",
    },
    // Whole-line guards for the most common bad import statements. The
    // identifier entries above usually fire first; these keep the table
    // safe under reordering.
    LiteralFix {
        find: "from diagrams.onprem.client import Users",
        replace: "from diagrams.onprem.client import User",
    },
    LiteralFix {
        find: "from diagrams.onprem.client import Clients",
        replace: "from diagrams.onprem.client import Client",
    },
    LiteralFix {
        find: "from diagrams.aws.database import DynamoDB",
        replace: "from diagrams.aws.database import Dynamodb",
    },
    LiteralFix {
        find: "from diagrams.aws.database import ElastiCache",
        replace: "from diagrams.aws.database import Elasticache",
    },
    LiteralFix {
        find: "from diagrams.aws.integration import EventBridge",
        replace: "from diagrams.aws.integration import Eventbridge",
    },
];

struct PatternFix {
    pattern: Regex,
    replacement: &'static str,
}

/// Typo classes that exact substitution cannot enumerate: doubled letters
/// and casing variants. Every rule is word-boundary anchored so it cannot
/// fire inside an unrelated longer identifier.
static PATTERN_FIXES: Lazy<Vec<PatternFix>> = Lazy::new(|| {
    [
        (r"\bStepFunctionss\b", "StepFunctions"),
        (r"\bStepfunctions\b", "StepFunctions"),
        (r"\bstepfunctions\b", "StepFunctions"),
        (r"\bDynamoDb\b", "Dynamodb"),
        (r"\bElasticCache\b", "Elasticache"),
        (r"\bApiGateway\b", "APIGateway"),
    ]
    .iter()
    .map(|&(pattern, replacement)| PatternFix {
        pattern: Regex::new(pattern).unwrap(),
        replacement,
    })
    .collect()
});

/// Replace every occurrence of each known bad substring, entries in table
/// order. Unconditionally safe, so it is always the first repair stage.
pub fn apply_literal_fixes(text: &str) -> String {
    let mut out = text.to_string();
    for fix in LITERAL_FIXES {
        if out.contains(fix.find) {
            out = out.replace(fix.find, fix.replace);
        }
    }
    out
}

/// Replace every match of each typo-class rule, rule order significant.
/// Applied after the literal fixes.
pub fn apply_pattern_fixes(text: &str) -> String {
    let mut out = text.to_string();
    for fix in PATTERN_FIXES.iter() {
        if let std::borrow::Cow::Owned(replaced) =
            fix.pattern.replace_all(&out, fix.replacement)
        {
            out = replaced;
        }
    }
    out
}

// A chain like "Userss" needs one pass per link (-> "Users" -> "User");
// well within this bound for any curated table.
const MAX_PASSES: usize = 8;

/// Both tables, literal first, iterated until the text stops changing.
/// The fixpoint is what makes the correction stage idempotent.
pub fn apply_corrections(text: &str) -> String {
    let mut out = text.to_string();
    for _ in 0..MAX_PASSES {
        let next = apply_pattern_fixes(&apply_literal_fixes(&out));
        if next == out {
            break;
        }
        out = next;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corrected(text: &str) -> String {
        apply_corrections(text)
    }

    #[test]
    fn literal_fixes_replace_every_occurrence() {
        let fixed = apply_literal_fixes("db = DynamoDB('a')\ncache = DynamoDB('b')");
        assert_eq!(fixed, "db = Dynamodb('a')\ncache = Dynamodb('b')");
    }

    #[test]
    fn step_function_pair_is_confluent() {
        // The StepFunction entry doubles the trailing s on already-correct
        // text; the following entry must undo it.
        assert_eq!(corrected("StepFunctions"), "StepFunctions");
        assert_eq!(corrected("StepFunction"), "StepFunctions");
        assert_eq!(corrected("StepFunctionss"), "StepFunctions");
    }

    #[test]
    fn pattern_fixes_cover_case_variants() {
        assert_eq!(corrected("stepfunctions"), "StepFunctions");
        assert_eq!(corrected("Stepfunctions"), "StepFunctions");
        assert_eq!(corrected("sfn = ApiGateway('x')"), "sfn = APIGateway('x')");
    }

    #[test]
    fn pattern_fixes_respect_word_boundaries() {
        // No pattern rule may fire inside a longer identifier.
        assert_eq!(apply_pattern_fixes("MyApiGatewayClient"), "MyApiGatewayClient");
        assert_eq!(apply_pattern_fixes("xstepfunctionsx"), "xstepfunctionsx");
    }

    #[test]
    fn bad_import_line_is_rewritten() {
        let fixed = corrected("from diagrams.aws.integration import EventBridge");
        assert_eq!(fixed, "from diagrams.aws.integration import Eventbridge");
    }

    #[test]
    fn tables_are_idempotent() {
        let inputs = [
            "from diagrams.aws.database import DynamoDB\ndb = DynamoDB('x')",
            "StepFunctionss and stepfunctions",
            "plain text with no bad symbols",
            "workflow = StepFunctions('flow')",
        ];
        for input in inputs {
            let once = corrected(input);
            assert_eq!(corrected(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn residual_chains_run_to_fixpoint() {
        // One literal pass turns "Userss" into "Users", which is itself a
        // table entry; apply_corrections must chase the chain down.
        assert_eq!(apply_literal_fixes("Userss"), "Users");
        assert_eq!(apply_corrections("Userss"), "User");
        assert_eq!(apply_corrections("User"), "User");
    }
}
