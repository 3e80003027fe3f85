// sentinel-core/src/domain/entity.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

use crate::domain::detection::{DEFAULT_CONTAMINATION, DEFAULT_WINDOW_SIZE};
use crate::domain::quality::FullMatch;

/// Evaluation settings of one logical entity ("customer", "transaction").
///
/// Detectors are opt-in: an empty `numeric_columns`, a missing
/// `temporal_analysis` or an empty `pattern_checks` disables the strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EntityConfig {
    #[validate(length(min = 1, message = "Entity name cannot be empty"))]
    pub name: String,

    #[validate(length(min = 1, message = "Entity table cannot be empty"))]
    pub table: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_column: Option<String>,

    #[serde(default)]
    pub numeric_columns: Vec<String>,

    #[validate(range(
        exclusive_min = 0.0,
        max = 0.5,
        message = "contamination must be in (0, 0.5]"
    ))]
    #[serde(default = "default_contamination")]
    pub contamination: f64,

    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_analysis: Option<TemporalConfig>,

    #[validate(custom(function = "validate_patterns"))]
    #[serde(default)]
    pub pattern_checks: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TemporalConfig {
    #[validate(length(min = 1, message = "time_column cannot be empty"))]
    pub time_column: String,

    #[validate(length(min = 1, message = "value_column cannot be empty"))]
    pub value_column: String,

    #[validate(range(min = 2, message = "window_size must be at least 2"))]
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

fn default_contamination() -> f64 {
    DEFAULT_CONTAMINATION
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn validate_patterns(patterns: &BTreeMap<String, String>) -> Result<(), ValidationError> {
    if patterns.iter().any(|(c, p)| c.is_empty() || p.is_empty()) {
        let mut err = ValidationError::new("empty_pattern");
        err.message = Some("pattern_checks entries need a column and a pattern".into());
        return Err(err);
    }
    if let Some((column, _)) = patterns.iter().find(|(_, p)| FullMatch::new(p).is_err()) {
        let mut err = ValidationError::new("invalid_pattern");
        err.message = Some(format!("pattern for column '{}' is not a valid regex", column).into());
        return Err(err);
    }
    Ok(())
}

impl EntityConfig {
    /// Entity bound to `table` with every detector disabled.
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            id_column: None,
            numeric_columns: Vec::new(),
            contamination: DEFAULT_CONTAMINATION,
            temporal_analysis: None,
            pattern_checks: BTreeMap::new(),
        }
    }
}
