//! Error types for image preprocessing.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while preparing an uploaded image.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("No such file: '{}'", .0.display())]
    FileNotFound(PathBuf),

    #[error("Invalid file type '{extension}'. Only JPG, PNG, and WEBP are allowed.")]
    InvalidFormat { path: PathBuf, extension: String },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an invalid format error.
    pub fn invalid_format(path: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            extension: extension.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the error was caused by the caller's input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MediaError::FileNotFound(_) | MediaError::InvalidFormat { .. } | MediaError::Image(_)
        )
    }
}
