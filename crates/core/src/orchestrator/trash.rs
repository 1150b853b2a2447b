//! Source removal: reversible trash first, permanent deletion second.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::invoker::{InvocationContext, ToolCatalog, ToolCommand, ToolRunner};

use super::error::TrashError;
use super::types::{CleanupKind, CleanupWarning};

/// A reversible-deletion collaborator (desktop trash, recycle bin).
#[async_trait]
pub trait Trash: Send + Sync {
    /// Returns the name of this trash implementation.
    fn name(&self) -> &str;

    /// Moves `path` to the trash.
    async fn trash(&self, path: &Path) -> Result<(), TrashError>;
}

/// Trashes files by running a configured command such as `gio trash`.
pub struct CommandTrash {
    program: PathBuf,
    args: Vec<String>,
    runner: Arc<dyn ToolRunner>,
}

impl CommandTrash {
    /// Builds from `tools.trash`. `None` when no command is configured.
    pub fn from_catalog(catalog: &ToolCatalog, runner: Arc<dyn ToolRunner>) -> Option<Self> {
        let (program, args) = catalog.trash.as_ref()?.split_first()?;
        Some(Self {
            program: PathBuf::from(program),
            args: args.to_vec(),
            runner,
        })
    }
}

#[async_trait]
impl Trash for CommandTrash {
    fn name(&self) -> &str {
        "command"
    }

    async fn trash(&self, path: &Path) -> Result<(), TrashError> {
        let command = ToolCommand::new(&self.program)
            .args(&self.args)
            .arg(path);
        let result = self
            .runner
            .run(command, &InvocationContext::default())
            .await?;
        if !result.success() {
            return Err(TrashError::Failed {
                path: path.to_path_buf(),
                exit_code: result.exit_code,
                output: result.output,
            });
        }
        Ok(())
    }
}

/// How a source file went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Trashed,
    Deleted,
}

/// Removes source files with an ordered fallback: the trash, if one is
/// configured, then permanent deletion.
#[derive(Clone, Default)]
pub struct SourceRemover {
    trash: Option<Arc<dyn Trash>>,
}

impl SourceRemover {
    pub fn new(trash: Option<Arc<dyn Trash>>) -> Self {
        Self { trash }
    }

    pub fn has_trash(&self) -> bool {
        self.trash.is_some()
    }

    /// Removes one file. Failure of both steps is reported as a warning.
    pub async fn remove(&self, path: &Path) -> Result<Removal, CleanupWarning> {
        if let Some(ref trash) = self.trash {
            match trash.trash(path).await {
                Ok(()) => {
                    debug!("Moved {} to trash via {}", path.display(), trash.name());
                    return Ok(Removal::Trashed);
                }
                Err(e) => {
                    warn!(
                        "Trash failed for {}: {}; deleting permanently",
                        path.display(),
                        e
                    );
                }
            }
        }

        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!("Deleted {}", path.display());
                Ok(Removal::Deleted)
            }
            Err(e) => Err(CleanupWarning {
                kind: CleanupKind::SourceFile,
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTrash, ScriptedRunner};
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"data").unwrap();
        path
    }

    #[tokio::test]
    async fn test_trash_first() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "game.iso");
        let trash = MockTrash::new();
        let remover = SourceRemover::new(Some(Arc::new(trash.clone())));

        assert_eq!(remover.remove(&file).await.unwrap(), Removal::Trashed);
        assert_eq!(trash.trashed_paths().await, vec![file.clone()]);
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_falls_back_to_delete() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "game.iso");
        let trash = MockTrash::new();
        trash.set_fail(true).await;
        let remover = SourceRemover::new(Some(Arc::new(trash.clone())));

        assert_eq!(remover.remove(&file).await.unwrap(), Removal::Deleted);
        assert!(trash.trashed_paths().await.is_empty());
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_no_trash_deletes() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "game.iso");
        let remover = SourceRemover::default();
        assert!(!remover.has_trash());
        assert_eq!(remover.remove(&file).await.unwrap(), Removal::Deleted);
    }

    #[tokio::test]
    async fn test_both_fail_is_warning() {
        let dir = TempDir::new().unwrap();
        let remover = SourceRemover::default();
        let warning = remover
            .remove(&dir.path().join("absent.iso"))
            .await
            .unwrap_err();
        assert_eq!(warning.kind, CleanupKind::SourceFile);
    }

    #[tokio::test]
    async fn test_command_trash() {
        let runner = ScriptedRunner::new();
        let catalog = ToolCatalog::default().with_trash(vec!["gio".to_string(), "trash".to_string()]);
        let trash = CommandTrash::from_catalog(&catalog, Arc::new(runner.clone())).unwrap();

        trash.trash(Path::new("/roms/game.iso")).await.unwrap();
        let calls = runner.recorded_commands().await;
        assert_eq!(calls[0].to_string(), "gio trash /roms/game.iso");

        runner.push_failure(1, "gio: Unable to trash").await;
        let err = trash.trash(Path::new("/roms/game.iso")).await.unwrap_err();
        assert!(matches!(err, TrashError::Failed { exit_code: Some(1), .. }));

        assert!(CommandTrash::from_catalog(&ToolCatalog::default(), Arc::new(runner)).is_none());
    }
}
