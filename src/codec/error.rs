//! Decode errors
//!
//! Every variant is terminal: the decoder never hands back a partial tree.

use thiserror::Error;

/// Coarse classification of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Unknown kind tag or unreadable header
    MalformedHeader,
    /// Input ended before a required field or terminator
    Truncated,
    /// Parent reference does not name a decoded node
    UnresolvableReference,
    /// Header was fine but the payload is not valid for its kind
    Payload,
    /// Configured resource limit exceeded
    Limit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty buffer")]
    Empty,

    #[error("buffer must start with a root record, found {found}")]
    MissingRoot { found: &'static str },

    #[error("unknown kind tag {tag:?} at offset {offset}")]
    UnknownKind { offset: usize, tag: char },

    #[error("malformed header at offset {offset}: {reason}")]
    MalformedHeader { offset: usize, reason: String },

    #[error("unexpected end of buffer at offset {offset}: expected {expected}")]
    Truncated {
        offset: usize,
        expected: &'static str,
    },

    #[error("unresolvable parent reference {reference} at offset {offset}")]
    UnresolvableReference { offset: usize, reference: usize },

    #[error("second root record at offset {offset}")]
    UnexpectedRoot { offset: usize },

    #[error("invalid payload at offset {offset}: {reason}")]
    InvalidPayload { offset: usize, reason: String },

    #[error("buffer holds more than {limit} nodes")]
    TooManyNodes { limit: usize },
}

impl DecodeError {
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            DecodeError::MissingRoot { .. }
            | DecodeError::UnknownKind { .. }
            | DecodeError::MalformedHeader { .. }
            | DecodeError::UnexpectedRoot { .. } => DecodeErrorKind::MalformedHeader,
            DecodeError::Empty | DecodeError::Truncated { .. } => DecodeErrorKind::Truncated,
            DecodeError::UnresolvableReference { .. } => DecodeErrorKind::UnresolvableReference,
            DecodeError::InvalidPayload { .. } => DecodeErrorKind::Payload,
            DecodeError::TooManyNodes { .. } => DecodeErrorKind::Limit,
        }
    }
}

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
