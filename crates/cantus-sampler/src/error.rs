//! Error types.

use thiserror::Error;

/// Error type for buffer loading and file streaming.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Hound(#[from] hound::Error),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid buffer: {0}")]
    InvalidBuffer(String),

    #[error("Invalid loop region: {0}")]
    InvalidLoop(String),

    #[error(transparent)]
    Core(#[from] cantus_core::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
