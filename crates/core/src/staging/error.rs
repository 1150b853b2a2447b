//! Error types for the staging module.

use std::path::PathBuf;
use thiserror::Error;

use crate::descriptor::DescriptorError;
use crate::invoker::{describe_exit, InvokerError};

/// Errors that can occur while preparing a staging area.
#[derive(Debug, Error)]
pub enum StagingError {
    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The input's extension is not handled by the selected conversion.
    #[error("Unsupported input {path} (expected one of: {accepted})")]
    UnsupportedInput { path: PathBuf, accepted: String },

    /// Failed to create the staging directory.
    #[error("Failed to create staging directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to copy a file into the staging directory.
    #[error("Failed to copy {from} to {to}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// The archive tool reported failure.
    #[error("Failed to extract archive {archive} ({})", describe_exit(.exit_code))]
    ExtractionFailed {
        archive: PathBuf,
        exit_code: Option<i32>,
        output: String,
    },

    /// No file with an accepted extension inside the extracted archive.
    #[error("No {extensions} file found in archive {archive}")]
    PrimaryNotFound { archive: PathBuf, extensions: String },

    /// Two staged files would share the same name at the staging root.
    #[error("Two staged files share the name {name}")]
    NameCollision { name: String },

    /// Descriptor could not be resolved or a dependent is missing.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// The archive tool could not run.
    #[error(transparent)]
    Tool(#[from] InvokerError),

    /// Failed to remove the staging directory.
    #[error("Failed to remove staging directory: {path}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StagingError {
    /// Creates a copy failed error.
    pub fn copy_failed(from: PathBuf, to: PathBuf, error: std::io::Error) -> Self {
        Self::CopyFailed { from, to, error }
    }

    /// Whether staging stopped because the job was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Tool(e) if e.is_cancelled())
    }

    /// Captured archive tool output, if the failure came from it.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::ExtractionFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}
