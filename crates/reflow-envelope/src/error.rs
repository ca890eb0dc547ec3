//! Envelope error types.

use thiserror::Error;

/// Errors that can occur serializing or parsing an envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// The body is not a valid envelope.
    #[error("invalid envelope JSON: {0}")]
    Parse(String),

    /// The envelope could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(String),
}
