//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::NodeId;

/// Domain errors represent violations of the widget tree invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid parent: node {0:?} is not part of this tree")]
    InvalidParent(NodeId),

    #[error("tree already has a root; a second root cannot be attached")]
    RootAlreadyPresent,

    #[error("invalid widget description: {message}")]
    InvalidDescription { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
