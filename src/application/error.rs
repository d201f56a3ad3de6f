//! Application-level errors (wraps domain and codec errors)

use thiserror::Error;

use crate::codec::DecodeError;
use crate::domain::DomainError;

/// Application errors wrap lower-level errors and add use-case context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("round trip mismatch: re-encoded buffer differs at byte {offset}")]
    RoundTripMismatch { offset: usize },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
