// sentinel-core/src/domain/quality/metric.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::quality::rule::RuleType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    NullRatio,
    DuplicateRatio,
    OutOfRangeRatio,
    InvalidPatternRatio,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NullRatio => "NULL_RATIO",
            Self::DuplicateRatio => "DUPLICATE_RATIO",
            Self::OutOfRangeRatio => "OUT_OF_RANGE_RATIO",
            Self::InvalidPatternRatio => "INVALID_PATTERN_RATIO",
        }
    }
}

impl From<RuleType> for MetricType {
    fn from(rule_type: RuleType) -> Self {
        match rule_type {
            RuleType::NullCheck => Self::NullRatio,
            RuleType::UniquenessCheck => Self::DuplicateRatio,
            RuleType::RangeCheck => Self::OutOfRangeRatio,
            RuleType::PatternCheck => Self::InvalidPatternRatio,
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricStatus {
    Passed,
    Failed,
}

impl MetricStatus {
    /// A metric fails only when it lands strictly above its threshold.
    pub fn evaluate(value: f64, threshold: f64) -> Self {
        if value > threshold {
            Self::Failed
        } else {
            Self::Passed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of evaluating one rule against one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub rule_id: i64,
    pub table_name: String,
    pub column_name: String,
    pub metric_type: MetricType,
    pub metric_value: f64,
    pub threshold_value: f64,
    pub status: MetricStatus,
    pub measured_at: DateTime<Utc>,
}

impl Metric {
    pub fn is_failed(&self) -> bool {
        self.status == MetricStatus::Failed
    }
}
