//! Error types for the sales query service.

use thiserror::Error;

/// Result type alias for store, configuration and server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised outside the pipeline stages.
///
/// Stage failures never surface here; they are carried as
/// [`crate::pipeline::StageError`] and rendered into the answer text.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// LLM client construction error
    #[error("LLM error: {0}")]
    Llm(#[from] crate::llm::LlmError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
