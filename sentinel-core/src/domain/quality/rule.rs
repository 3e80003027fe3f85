// sentinel-core/src/domain/quality/rule.rs

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::domain::error::DomainError;
use crate::domain::quality::severity::Severity;

/// A quality rule as it is stored (YAML file, database row).
///
/// `rule_type` and `severity` stay as raw strings here so that a single
/// malformed rule can be reported and skipped instead of failing the whole
/// rule file. [`Rule::try_from`] turns a record into its typed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RuleRecord {
    #[serde(default)]
    pub rule_id: i64,
    #[validate(length(min = 1, message = "table_name cannot be empty"))]
    pub table_name: String,
    #[validate(length(min = 1, message = "column_name cannot be empty"))]
    pub column_name: String,
    pub rule_type: String,
    #[serde(default)]
    pub rule_definition: Map<String, JsonValue>,
    pub threshold: f64,
    pub severity: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    NullCheck,
    UniquenessCheck,
    RangeCheck,
    PatternCheck,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NullCheck => "NULL_CHECK",
            Self::UniquenessCheck => "UNIQUENESS_CHECK",
            Self::RangeCheck => "RANGE_CHECK",
            Self::PatternCheck => "PATTERN_CHECK",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NULL_CHECK" => Ok(Self::NullCheck),
            "UNIQUENESS_CHECK" => Ok(Self::UniquenessCheck),
            "RANGE_CHECK" => Ok(Self::RangeCheck),
            "PATTERN_CHECK" => Ok(Self::PatternCheck),
            _ => Err(format!("Unknown rule type: {}", s)),
        }
    }
}

/// A compiled, full-string regular expression.
#[derive(Debug, Clone)]
pub struct FullMatch {
    source: String,
    regex: Regex,
}

impl FullMatch {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Rule kinds with their own parameter payloads.
#[derive(Debug, Clone)]
pub enum RuleKind {
    NullCheck,
    UniquenessCheck,
    RangeCheck { min: Option<f64>, max: Option<f64> },
    PatternCheck { pattern: FullMatch },
}

impl RuleKind {
    pub fn rule_type(&self) -> RuleType {
        match self {
            Self::NullCheck => RuleType::NullCheck,
            Self::UniquenessCheck => RuleType::UniquenessCheck,
            Self::RangeCheck { .. } => RuleType::RangeCheck,
            Self::PatternCheck { .. } => RuleType::PatternCheck,
        }
    }
}

/// A validated quality rule, immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct Rule {
    pub rule_id: i64,
    pub table_name: String,
    pub column_name: String,
    pub kind: RuleKind,
    pub threshold: f64,
    pub severity: Severity,
}

impl Rule {
    pub fn applies_to(&self, table_name: &str) -> bool {
        self.table_name == table_name
    }
}

impl TryFrom<&RuleRecord> for Rule {
    type Error = DomainError;

    fn try_from(record: &RuleRecord) -> Result<Self, Self::Error> {
        let id = record.rule_id;

        record
            .validate()
            .map_err(|e| DomainError::configuration(id, e.to_string()))?;

        let rule_type =
            RuleType::from_str(&record.rule_type).map_err(|e| DomainError::configuration(id, e))?;
        let severity =
            Severity::from_str(&record.severity).map_err(|e| DomainError::configuration(id, e))?;

        if !record.threshold.is_finite() || !(0.0..=1.0).contains(&record.threshold) {
            return Err(DomainError::configuration(
                id,
                format!("threshold {} is outside [0, 1]", record.threshold),
            ));
        }

        let def = &record.rule_definition;
        let kind = match rule_type {
            RuleType::NullCheck => RuleKind::NullCheck,
            RuleType::UniquenessCheck => RuleKind::UniquenessCheck,
            RuleType::RangeCheck => {
                let min = bound(def, "min", id)?;
                let max = bound(def, "max", id)?;
                if let (Some(lo), Some(hi)) = (min, max)
                    && lo > hi
                {
                    return Err(DomainError::configuration(
                        id,
                        format!("range min {} is greater than max {}", lo, hi),
                    ));
                }
                RuleKind::RangeCheck { min, max }
            }
            RuleType::PatternCheck => {
                let raw = def
                    .get("pattern")
                    .and_then(JsonValue::as_str)
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| {
                        DomainError::configuration(id, "PATTERN_CHECK requires a 'pattern' string")
                    })?;
                let pattern = FullMatch::new(raw).map_err(|e| {
                    DomainError::configuration(id, format!("invalid pattern: {}", e))
                })?;
                RuleKind::PatternCheck { pattern }
            }
        };

        Ok(Rule {
            rule_id: id,
            table_name: record.table_name.clone(),
            column_name: record.column_name.clone(),
            kind,
            threshold: record.threshold,
            severity,
        })
    }
}

fn bound(def: &Map<String, JsonValue>, key: &str, id: i64) -> Result<Option<f64>, DomainError> {
    match def.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => Ok(n.as_f64()),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| {
                DomainError::configuration(id, format!("range '{}' is not a number: {}", key, s))
            }),
        Some(other) => Err(DomainError::configuration(
            id,
            format!("range '{}' is not a number: {}", key, other),
        )),
    }
}
