// sentinel-core/src/domain/quality/anomaly.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::quality::rule::RuleType;
use crate::domain::quality::severity::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyType {
    Statistical,
    Temporal,
    Pattern,
    HighNullRatio,
    HighDuplicateRatio,
    OutOfRangeValues,
    InvalidPatterns,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Statistical => "STATISTICAL",
            Self::Temporal => "TEMPORAL",
            Self::Pattern => "PATTERN",
            Self::HighNullRatio => "HIGH_NULL_RATIO",
            Self::HighDuplicateRatio => "HIGH_DUPLICATE_RATIO",
            Self::OutOfRangeValues => "OUT_OF_RANGE_VALUES",
            Self::InvalidPatterns => "INVALID_PATTERNS",
        }
    }
}

impl From<RuleType> for AnomalyType {
    fn from(rule_type: RuleType) -> Self {
        match rule_type {
            RuleType::NullCheck => Self::HighNullRatio,
            RuleType::UniquenessCheck => Self::HighDuplicateRatio,
            RuleType::RangeCheck => Self::OutOfRangeValues,
            RuleType::PatternCheck => Self::InvalidPatterns,
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A flagged deviation: either one row picked by a detector, or one failed rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub anomaly_type: AnomalyType,
    pub description: String,
    pub severity: Severity,
    pub detected_at: DateTime<Utc>,
}

impl Anomaly {
    /// Anomaly attached to a single record of the snapshot.
    pub fn for_record(
        table_name: &str,
        record_id: String,
        anomaly_type: AnomalyType,
        description: String,
        severity: Severity,
    ) -> Self {
        Self {
            table_name: table_name.to_string(),
            column_name: None,
            record_id: Some(record_id),
            anomaly_type,
            description,
            severity,
            detected_at: Utc::now(),
        }
    }

    /// Anomaly attached to a whole column (rule failure).
    pub fn for_column(
        table_name: &str,
        column_name: &str,
        anomaly_type: AnomalyType,
        description: String,
        severity: Severity,
    ) -> Self {
        Self {
            table_name: table_name.to_string(),
            column_name: Some(column_name.to_string()),
            record_id: None,
            anomaly_type,
            description,
            severity,
            detected_at: Utc::now(),
        }
    }

    pub fn with_column(mut self, column_name: &str) -> Self {
        self.column_name = Some(column_name.to_string());
        self
    }
}
