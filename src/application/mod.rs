//! Application layer: services and use cases
//!
//! This layer wires the codec to configuration and file input.

pub mod error;
pub mod error_ext;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use services::{CodecService, VerifyReport};
