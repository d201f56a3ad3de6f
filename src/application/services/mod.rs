//! Application services

pub mod codec;

pub use codec::{CodecService, VerifyReport};
