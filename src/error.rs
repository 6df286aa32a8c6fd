//! Error types for the submission client.

use thiserror::Error;

/// Main error type for submission operations.
#[derive(Error, Debug)]
pub enum CrptError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-blocking admission was refused because the queue is at capacity
    #[error("Submission queue is full")]
    QueueFull,

    /// The dispatch loop is gone; the task was never admitted
    #[error("Submission pipeline is shut down")]
    Shutdown,

    /// Document could not be rendered into the wire envelope
    #[error("Document encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// The network call failed outright
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for CrptError {
    fn from(err: reqwest::Error) -> Self {
        CrptError::Transport(err.to_string())
    }
}

/// Result type alias for submission operations.
pub type Result<T> = std::result::Result<T, CrptError>;
