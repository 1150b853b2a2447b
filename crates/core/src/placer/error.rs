//! Error types for the placer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while placing an artifact.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// The staged artifact is gone.
    #[error("Artifact not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Every suffixed name up to the cap is taken.
    #[error("No free name for {path} after {max_suffix} attempts")]
    NamesExhausted { path: PathBuf, max_suffix: u32 },

    /// The destination does not exist and may not be created.
    #[error("Destination directory does not exist: {path}")]
    DestinationMissing { path: PathBuf },

    /// Failed to create the destination directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to move or copy the artifact.
    #[error("Failed to move {from} to {to}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Permission denied.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlacementError {
    /// Creates a move failed error, classifying permission problems.
    pub fn move_failed(from: PathBuf, to: PathBuf, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied { path: to };
        }
        Self::MoveFailed { from, to, error }
    }
}
