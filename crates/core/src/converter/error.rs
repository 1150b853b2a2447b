//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

use crate::invoker::{describe_exit, InvokerError};

/// Errors that can occur during a conversion routine.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// A tool step exited unsuccessfully.
    #[error("{step} failed ({})", describe_exit(.exit_code))]
    ToolFailed {
        step: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// The tool reported success but the declared artifact is missing.
    #[error("Expected output not created: {path}")]
    ArtifactMissing { path: PathBuf },

    /// The tool reported success but the declared artifact is empty.
    #[error("Expected output is empty: {path}")]
    ArtifactEmpty { path: PathBuf },

    /// No companion track files were produced.
    #[error("No {extensions} track files found for {base}")]
    SecondaryMissing { base: String, extensions: String },

    /// The staged input is not where the routine expects it.
    #[error("Staged input not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The tool could not be run.
    #[error(transparent)]
    Tool(#[from] InvokerError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    /// Creates a tool failed error.
    pub fn tool_failed(step: impl Into<String>, exit_code: Option<i32>, output: String) -> Self {
        Self::ToolFailed {
            step: step.into(),
            exit_code,
            output,
        }
    }

    /// Whether the tool exited cleanly but left no usable output.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::ArtifactMissing { .. } | Self::ArtifactEmpty { .. } | Self::SecondaryMissing { .. }
        )
    }

    /// Whether the routine stopped because the job was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Tool(e) if e.is_cancelled())
    }

    /// Captured tool output for a failed step.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::ToolFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}
