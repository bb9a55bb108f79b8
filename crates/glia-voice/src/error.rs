//! Error types for the Glia emotion annotation pipeline

use thiserror::Error;

/// Result type alias for voice operations
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Errors that can occur while annotating call audio
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Emotion model error: {0}")]
    Model(String),

    #[error("Emotion model returned {got} logits, expected {expected}")]
    ModelShape { expected: usize, got: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
