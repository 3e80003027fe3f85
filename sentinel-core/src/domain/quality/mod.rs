// sentinel-core/src/domain/quality/mod.rs

pub mod anomaly;
pub mod evaluator;
pub mod metric;
pub mod rule;
pub mod severity;

// Re-exports
pub use anomaly::{Anomaly, AnomalyType};
pub use evaluator::MetricEvaluator;
pub use metric::{Metric, MetricStatus, MetricType};
pub use rule::{FullMatch, Rule, RuleKind, RuleRecord, RuleType};
pub use severity::Severity;
