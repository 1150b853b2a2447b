//! Error types for the invoker module.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that prevent an external tool from producing an exit status.
#[derive(Debug, Error)]
pub enum InvokerError {
    /// Executable not found.
    #[error("Tool not found: {program}")]
    ToolNotFound { program: PathBuf },

    /// Executable exists but could not be started.
    #[error("Permission denied running tool: {program}")]
    PermissionDenied { program: PathBuf },

    /// Spawning failed for another reason.
    #[error("Failed to start tool {program}")]
    SpawnFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tool exceeded the configured timeout and was killed.
    #[error("Tool {program} timed out after {timeout_secs} seconds")]
    Timeout { program: PathBuf, timeout_secs: u64 },

    /// The job was cancelled and the tool was killed.
    #[error("Tool {program} was cancelled")]
    Cancelled { program: PathBuf },

    /// I/O error while supervising the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InvokerError {
    /// Classifies an error returned by `Command::spawn`.
    pub fn from_spawn(program: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::ToolNotFound {
                program: program.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                program: program.to_path_buf(),
            },
            _ => Self::SpawnFailed {
                program: program.to_path_buf(),
                source: error,
            },
        }
    }

    /// Whether the invocation stopped because the job was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
