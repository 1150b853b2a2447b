//! Error types for the job orchestrator.

use std::path::PathBuf;
use thiserror::Error;

use crate::converter::ConversionError;
use crate::invoker::{describe_exit, InvokerError};
use crate::placer::PlacementError;
use crate::staging::StagingError;

/// Any error that ends a job as a failure.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    /// The input has no parent directory to place artifacts next to.
    #[error("No destination directory for {path}")]
    NoDestination { path: PathBuf },

    /// The job was cancelled between steps.
    #[error("Job cancelled")]
    Cancelled,
}

impl JobError {
    /// One-line error class.
    pub fn classification(&self) -> &'static str {
        if self.is_cancelled() {
            return "cancelled";
        }
        match self {
            Self::Staging(_) => "staging_error",
            Self::Conversion(e) if e.is_verification_failure() => "artifact_verification_error",
            Self::Conversion(_) => "tool_invocation_error",
            Self::Placement(_) | Self::NoDestination { .. } => "placement_error",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Staging(e) => e.is_cancelled(),
            Self::Conversion(e) => e.is_cancelled(),
            _ => false,
        }
    }

    /// Captured tool output, when a tool ran and failed.
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::Staging(e) => e.tool_output(),
            Self::Conversion(e) => e.tool_output(),
            _ => None,
        }
    }

    /// The error message followed by the verbatim tool output.
    pub fn diagnostic(&self) -> String {
        match self.tool_output().filter(|o| !o.trim().is_empty()) {
            Some(output) => format!("{}\n{}", self, output),
            None => self.to_string(),
        }
    }
}

/// Errors from a trash collaborator.
#[derive(Debug, Error)]
pub enum TrashError {
    /// The trash command exited unsuccessfully.
    #[error("Trash command failed for {path} ({}): {output}", describe_exit(.exit_code))]
    Failed {
        path: PathBuf,
        exit_code: Option<i32>,
        output: String,
    },

    /// The trash command could not be run.
    #[error(transparent)]
    Tool(#[from] InvokerError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
