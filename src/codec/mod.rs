//! Codec layer: flat text wire format for widget trees
//!
//! A tree is written as a sequence of records in depth-first pre-order,
//! without counts or length prefixes around the sequence. Two header
//! layouts exist, selected by [`Format`]:
//!
//! - [`Format::Indexed`]: each record carries its own pre-order id and its
//!   parent's id.
//! - [`Format::Positional`]: each record carries the slot inherited from its
//!   parent, derived from depth and sibling rank.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod grammar;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use decoder::{Decoder, DEFAULT_MAX_NODES};
pub use encoder::Encoder;
pub use error::{DecodeError, DecodeErrorKind, DecodeResult};

use crate::domain::WidgetTree;

/// Header layout of the wire format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Explicit node id and parent id per record
    #[default]
    Indexed,
    /// Inherited slot per record
    Positional,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Indexed => write!(f, "indexed"),
            Format::Positional => write!(f, "positional"),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indexed" => Ok(Format::Indexed),
            "positional" => Ok(Format::Positional),
            other => Err(format!("unknown wire format: {}", other)),
        }
    }
}

/// Encodes `tree` in the default format.
pub fn encode(tree: &WidgetTree) -> String {
    Encoder::default().encode(tree)
}

/// Decodes a buffer written in the default format.
pub fn decode(buffer: &str) -> DecodeResult<WidgetTree> {
    Decoder::default().decode(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_format_names_when_parsing_then_case_insensitive() {
        assert_eq!("Positional".parse::<Format>(), Ok(Format::Positional));
        assert_eq!(" indexed ".parse::<Format>(), Ok(Format::Indexed));
        assert!("binary".parse::<Format>().is_err());
    }

    #[test]
    fn given_format_when_displayed_then_parses_back() {
        for format in [Format::Indexed, Format::Positional] {
            assert_eq!(format.to_string().parse::<Format>(), Ok(format));
        }
    }
}
