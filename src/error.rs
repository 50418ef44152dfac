// Typed errors with thiserror. Surface meaningful messages to JS.
// Nothing here is fatal: every failure degrades to a still-usable state.

use thiserror::Error;

/// Engine error types.
#[derive(Error, Debug)]
pub enum GachaError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Rarity weights must sum to 1.0, got {sum}")]
    InvalidWeights { sum: f64 },

    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GachaError {
    fn from(err: serde_json::Error) -> Self {
        GachaError::Serialization(err.to_string())
    }
}
