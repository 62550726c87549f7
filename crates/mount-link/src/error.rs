//! Error types for the mount link.

use thiserror::Error;

/// Mount link error type.
#[derive(Error, Debug)]
pub enum LinkError {
    /// Command text failed the `:...#` syntax rule
    #[error("{0}")]
    InvalidCommand(String),

    /// Transport failed without a more specific cause
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Controller answered with a non-success status
    #[error("Controller returned HTTP {status} ({body_summary})")]
    Status { status: u16, body_summary: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for mount link operations.
pub type LinkResult<T> = Result<T, LinkError>;
