//! Error types for pointerflow

use thiserror::Error;

/// Errors that can occur while configuring or running a simulation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid regime '{label}': {reason}")]
    InvalidRegime { label: String, reason: String },

    #[error("Invalid timeline entry {index} ('{label}'): {reason}")]
    InvalidTimeline {
        index: usize,
        label: String,
        reason: String,
    },

    #[error("Invalid canvas: {0}")]
    InvalidCanvas(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
