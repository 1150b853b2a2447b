//! Error types for the descriptor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving a descriptor's dependent files.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The path does not carry a `.cue` or `.gdi` extension.
    #[error("Not a CUE or GDI descriptor: {path}")]
    UnsupportedDescriptor { path: PathBuf },

    /// The descriptor could not be read.
    #[error("Failed to read descriptor {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file referenced by the descriptor does not exist.
    #[error("Dependent file not found: {name} (referenced by {descriptor})")]
    DependentNotFound {
        descriptor: PathBuf,
        name: String,
        expected: PathBuf,
    },
}

impl DescriptorError {
    /// Creates a read failed error.
    pub fn read_failed(path: PathBuf, source: std::io::Error) -> Self {
        Self::ReadFailed { path, source }
    }
}
