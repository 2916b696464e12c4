//! Protocol error types.

use thiserror::Error;

/// Errors raised while encoding or decoding open-metadata payloads.
#[derive(Debug, Error)]
pub enum Error {
    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// A property held a value of a different kind than requested.
    #[error("property {name} is not a {expected} value")]
    KindMismatch {
        /// Property name.
        name: String,
        /// Kind that was requested.
        expected: &'static str,
    },
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;
