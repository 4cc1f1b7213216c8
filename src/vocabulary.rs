//! Component vocabulary: namespace -> valid symbol names.

use once_cell::sync::Lazy;
use std::sync::Arc;

/// Builtin component table. Order matters: the substring-containment
/// heuristic in `similarity` breaks ties by registry order.
const BUILTIN_COMPONENTS: &[(&str, &[&str])] = &[
    (
        "diagrams.aws.compute",
        &[
            "EC2",
            "Lambda",
            "ECS",
            "EKS",
            "Batch",
            "Fargate",
            "ElasticBeanstalk",
        ],
    ),
    (
        "diagrams.aws.database",
        &[
            "RDS",
            "Dynamodb",
            "Aurora",
            "Elasticache",
            "ElastiCache",
            "DocumentdbMongodbCompatibility",
            "Neptune",
            "Redshift",
            "Timestream",
        ],
    ),
    (
        "diagrams.aws.network",
        &[
            "ELB",
            "ALB",
            "NLB",
            "CloudFront",
            "Route53",
            "APIGateway",
            "VPC",
            "DirectConnect",
            "CloudMap",
        ],
    ),
    (
        "diagrams.aws.storage",
        &["S3", "EBS", "EFS", "Backup", "StorageGateway", "Fsx"],
    ),
    // Canonical casing is Eventbridge; EventBridge is not a valid symbol.
    (
        "diagrams.aws.integration",
        &[
            "SQS",
            "SNS",
            "StepFunctions",
            "Eventbridge",
            "MQ",
            "Appsync",
            "ExpressWorkflows",
        ],
    ),
    ("diagrams.onprem.client", &["User", "Client"]),
    (
        "diagrams.onprem.database",
        &["PostgreSQL", "MySQL", "MongoDB", "Cassandra", "Mariadb"],
    ),
    ("diagrams.onprem.inmemory", &["Redis", "Memcached"]),
    (
        "diagrams.onprem.queue",
        &["Kafka", "RabbitMQ", "Celery", "Activemq"],
    ),
    (
        "diagrams.onprem.monitoring",
        &["Prometheus", "Grafana", "Datadog", "Splunk"],
    ),
    (
        "diagrams.programming.framework",
        &["React", "Django", "FastAPI", "Spring", "Flask"],
    ),
    (
        "diagrams.programming.language",
        &["Python", "Java", "NodeJS", "Go", "Javascript"],
    ),
    (
        "diagrams.k8s.compute",
        &["Pod", "Deployment", "StatefulSet", "Job", "DaemonSet"],
    ),
    ("diagrams.k8s.network", &["Ingress", "Service"]),
    ("diagrams.k8s.storage", &["PV", "PVC", "StorageClass"]),
];

static BUILTIN: Lazy<Arc<Vocabulary>> = Lazy::new(|| {
    Arc::new(Vocabulary::from_entries(BUILTIN_COMPONENTS.iter().map(
        |(namespace, symbols)| {
            (
                (*namespace).to_string(),
                symbols.iter().map(|s| (*s).to_string()).collect(),
            )
        },
    )))
});

/// The closed set of valid symbols, grouped by namespace.
///
/// Constructed once and never mutated; share it as `Arc<Vocabulary>`.
/// Namespace order and symbol order are preserved from construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    namespaces: Vec<(String, Vec<String>)>,
}

impl Vocabulary {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let namespaces: Vec<(String, Vec<String>)> = entries.into_iter().collect();

        debug_assert!(namespaces.iter().all(|(ns, _)| !ns.is_empty()));
        debug_assert!(namespaces.iter().all(|(_, symbols)| !symbols.is_empty()));

        Vocabulary { namespaces }
    }

    /// The process-wide builtin table covering the `diagrams.*` provider
    /// modules.
    pub fn builtin() -> Arc<Vocabulary> {
        Arc::clone(&BUILTIN)
    }

    /// Valid symbols for `namespace`, in registry order. `None` for
    /// namespaces outside the registry's key space.
    pub fn symbols(&self, namespace: &str) -> Option<&[String]> {
        self.namespaces
            .iter()
            .find(|(ns, _)| ns == namespace)
            .map(|(_, symbols)| symbols.as_slice())
    }

    pub fn is_known_namespace(&self, namespace: &str) -> bool {
        self.symbols(namespace).is_some()
    }

    /// Exact (case-sensitive) membership check.
    pub fn contains(&self, namespace: &str, symbol: &str) -> bool {
        self.symbols(namespace)
            .map(|symbols| symbols.iter().any(|s| s == symbol))
            .unwrap_or(false)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.namespaces
            .iter()
            .map(|(ns, symbols)| (ns.as_str(), symbols.as_slice()))
    }
}
