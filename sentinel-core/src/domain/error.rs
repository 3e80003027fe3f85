// sentinel-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Invalid quality rule #{rule_id}: {reason}")]
    #[diagnostic(
        code(sentinel::domain::configuration),
        help("Check rule_type, severity, threshold and rule_definition of this rule.")
    )]
    Configuration { rule_id: i64, reason: String },

    #[error("{strategy} detection failed: {reason}")]
    #[diagnostic(code(sentinel::domain::computation))]
    Computation {
        strategy: &'static str,
        reason: String,
    },

    #[error("Invalid parameter: {0}")]
    #[diagnostic(code(sentinel::domain::parameter))]
    InvalidParameter(String),

    #[error("Malformed snapshot: {0}")]
    #[diagnostic(code(sentinel::domain::snapshot))]
    SnapshotShape(String),
}

impl DomainError {
    pub fn configuration(rule_id: i64, reason: impl Into<String>) -> Self {
        Self::Configuration {
            rule_id,
            reason: reason.into(),
        }
    }

    pub fn computation(strategy: &'static str, reason: impl Into<String>) -> Self {
        Self::Computation {
            strategy,
            reason: reason.into(),
        }
    }
}
