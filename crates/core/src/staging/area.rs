//! The per-job staging directory.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::error::StagingError;

/// An isolated temporary directory owned by exactly one job.
///
/// Call [`StagingArea::cleanup`] on every exit path. If the area is dropped
/// without it (panic, aborted task) the directory is removed synchronously.
#[derive(Debug)]
pub struct StagingArea {
    root: PathBuf,
    primary: Option<PathBuf>,
    files: Vec<PathBuf>,
    removed: bool,
}

impl StagingArea {
    pub(crate) fn new(root: PathBuf) -> Self {
        Self {
            root,
            primary: None,
            files: Vec::new(),
            removed: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The staged primary input. For whole-archive jobs this is the
    /// extracted directory.
    pub fn primary(&self) -> Option<&Path> {
        self.primary.as_deref()
    }

    /// Every file placed at the staging root, primary first.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub(crate) fn set_primary(&mut self, path: PathBuf) {
        self.primary = Some(path);
    }

    pub(crate) fn add_file(&mut self, path: PathBuf) {
        self.files.push(path);
    }

    /// Recursively deletes the staging directory.
    ///
    /// Idempotent; a directory that is already gone counts as removed.
    pub async fn cleanup(&mut self) -> Result<(), StagingError> {
        if self.removed {
            return Ok(());
        }
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {
                debug!("Removed staging directory {}", self.root.display());
                self.removed = true;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.removed = true;
                Ok(())
            }
            Err(e) => Err(StagingError::CleanupFailed {
                path: self.root.clone(),
                error: e,
            }),
        }
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "Failed to remove staging directory {} on drop: {}",
                    self.root.display(),
                    e
                );
            }
        }
    }
}
