//! Mock trash for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::orchestrator::{Trash, TrashError};

/// Mock implementation of the Trash trait.
///
/// A successful call deletes the file, standing in for the move to the
/// desktop trash, and records the path.
///
/// # Example
///
/// ```rust,ignore
/// use ozconv_core::testing::MockTrash;
///
/// let trash = MockTrash::new();
/// trash.set_fail(true).await; // force the permanent-delete fallback
///
/// // ... run a job with delete_source ...
///
/// assert!(trash.trashed_paths().await.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTrash {
    /// Paths trashed so far.
    trashed: Arc<RwLock<Vec<PathBuf>>>,
    /// Whether every call fails.
    fail: Arc<RwLock<bool>>,
}

impl MockTrash {
    /// Create a new mock trash that succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail (or succeed again).
    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Get all trashed paths, in call order.
    pub async fn trashed_paths(&self) -> Vec<PathBuf> {
        self.trashed.read().await.clone()
    }
}

#[async_trait]
impl Trash for MockTrash {
    fn name(&self) -> &str {
        "mock"
    }

    async fn trash(&self, path: &Path) -> Result<(), TrashError> {
        if *self.fail.read().await {
            return Err(TrashError::Failed {
                path: path.to_path_buf(),
                exit_code: Some(1),
                output: "trash unavailable".to_string(),
            });
        }
        tokio::fs::remove_file(path).await?;
        self.trashed.write().await.push(path.to_path_buf());
        Ok(())
    }
}
