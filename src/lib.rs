//! uiwire: flat text wire format for UI widget trees
//!
//! Architecture:
//! - `domain`: widget tree model (arena storage, descriptions)
//! - `codec`: encoder and decoder for the wire format
//! - `application`: services combining codec, configuration and file input
//! - `cli`: command-line interface
//! - `config`: layered settings

pub mod application;
pub mod cli;
pub mod codec;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;

pub use codec::{decode, encode, Decoder, Encoder, Format};
pub use domain::{Alignment, NodeId, WidgetKind, WidgetTree};
