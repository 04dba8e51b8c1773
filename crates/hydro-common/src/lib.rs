//! Common types and utilities shared across the datastream services.

pub mod error;
pub mod source;

pub use error::{DataStreamError, DataStreamResult};
pub use source::{fetch_bytes, fetch_to_temp, LocalCopy, SourceLocation};
