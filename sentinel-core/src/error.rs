// sentinel-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum SentinelError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    #[error("Failed to persist {batch} batch: {reason}")]
    #[diagnostic(
        code(sentinel::persistence),
        help("Results are kept in the report; persistence can be retried.")
    )]
    Persistence { batch: &'static str, reason: String },

    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for SentinelError {
    fn from(err: std::io::Error) -> Self {
        SentinelError::Infrastructure(InfrastructureError::Io(err))
    }
}
