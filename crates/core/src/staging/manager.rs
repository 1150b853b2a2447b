//! Staging area manager implementation.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::descriptor::{check_dependents, resolve_dependents, DescriptorKind};
use crate::invoker::{InvocationContext, Tool, ToolCatalog, ToolCommand, ToolRunner};

use super::archive::{archive_stem, find_primary, is_archive};
use super::area::StagingArea;
use super::config::StagingConfig;
use super::error::StagingError;
use super::types::{ArchiveHandling, InputPolicy};

/// Subdirectory of the staging root that archives are extracted into.
const EXTRACT_DIR: &str = "extracted";

/// Creates and fills staging areas.
pub struct StagingManager {
    config: StagingConfig,
    catalog: ToolCatalog,
    runner: Arc<dyn ToolRunner>,
}

impl StagingManager {
    pub fn new(config: StagingConfig, catalog: ToolCatalog, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            config,
            catalog,
            runner,
        }
    }

    /// Creates a fresh, uniquely named, empty staging directory for `input`.
    pub async fn allocate(&self, input: &Path) -> Result<StagingArea, StagingError> {
        tokio::fs::create_dir_all(&self.config.temp_root)
            .await
            .map_err(|e| StagingError::DirectoryCreationFailed {
                path: self.config.temp_root.clone(),
                error: e,
            })?;

        let stem = archive_stem(input).unwrap_or_else(|| "job".to_string());
        let unique = uuid::Uuid::new_v4().simple().to_string();
        let root = self
            .config
            .temp_root
            .join(format!("{}_{}_temp", stem, &unique[..8]));

        tokio::fs::create_dir(&root)
            .await
            .map_err(|e| StagingError::DirectoryCreationFailed {
                path: root.clone(),
                error: e,
            })?;

        debug!("Allocated staging directory {}", root.display());
        Ok(StagingArea::new(root))
    }

    /// Copies or extracts `input` and its dependents into `area`.
    ///
    /// Returns the staged primary path. On error the area may be partially
    /// populated; the caller still owns it and must clean it up.
    pub async fn populate(
        &self,
        area: &mut StagingArea,
        input: &Path,
        policy: &InputPolicy,
        ctx: &InvocationContext,
    ) -> Result<PathBuf, StagingError> {
        match tokio::fs::metadata(input).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                return Err(StagingError::InputNotFound {
                    path: input.to_path_buf(),
                })
            }
        }

        if !policy.accepts(input) {
            return Err(StagingError::UnsupportedInput {
                path: input.to_path_buf(),
                accepted: policy.describe(),
            });
        }

        if is_archive(input) {
            self.populate_from_archive(area, input, policy, ctx).await
        } else {
            self.populate_from_file(area, input).await
        }
    }

    /// Allocates and populates in one step, removing the area on failure.
    #[cfg(test)]
    async fn stage(
        &self,
        input: &Path,
        policy: &InputPolicy,
        ctx: &InvocationContext,
    ) -> Result<StagingArea, StagingError> {
        let mut area = self.allocate(input).await?;
        match self.populate(&mut area, input, policy, ctx).await {
            Ok(_) => Ok(area),
            Err(e) => {
                let _ = area.cleanup().await;
                Err(e)
            }
        }
    }

    async fn populate_from_file(
        &self,
        area: &mut StagingArea,
        input: &Path,
    ) -> Result<PathBuf, StagingError> {
        let mut sources = vec![input.to_path_buf()];
        if DescriptorKind::from_path(input).is_some() {
            let set = resolve_dependents(input).await?;
            sources.extend(check_dependents(&set).await?);
        }

        ensure_unique_names(&sources)?;

        let mut staged_primary = None;
        for source in &sources {
            let dest = area.root().join(file_name(source)?);
            tokio::fs::copy(source, &dest)
                .await
                .map_err(|e| StagingError::copy_failed(source.clone(), dest.clone(), e))?;
            debug!("Staged {} -> {}", source.display(), dest.display());
            if staged_primary.is_none() {
                staged_primary = Some(dest.clone());
            }
            area.add_file(dest);
        }

        let primary = staged_primary.ok_or_else(|| StagingError::InputNotFound {
            path: input.to_path_buf(),
        })?;
        area.set_primary(primary.clone());
        info!(
            "Staged {} file(s) for {}",
            area.files().len(),
            input.display()
        );
        Ok(primary)
    }

    async fn populate_from_archive(
        &self,
        area: &mut StagingArea,
        archive: &Path,
        policy: &InputPolicy,
        ctx: &InvocationContext,
    ) -> Result<PathBuf, StagingError> {
        let extract_dir = area.root().join(EXTRACT_DIR);
        tokio::fs::create_dir_all(&extract_dir).await?;

        let mut target = OsString::from("-o");
        target.push(extract_dir.as_os_str());
        let command = ToolCommand::new(self.catalog.path(Tool::SevenZip))
            .arg("x")
            .arg(archive)
            .arg(target)
            .arg("-y");

        info!("Extracting archive {}", archive.display());
        let result = self.runner.run(command, ctx).await?;
        if !result.success() {
            return Err(StagingError::ExtractionFailed {
                archive: archive.to_path_buf(),
                exit_code: result.exit_code,
                output: result.output,
            });
        }

        if policy.archives == ArchiveHandling::WholeTree {
            area.set_primary(extract_dir.clone());
            return Ok(extract_dir);
        }

        let found = find_primary(&extract_dir, policy.extensions)
            .await?
            .ok_or_else(|| StagingError::PrimaryNotFound {
                archive: archive.to_path_buf(),
                extensions: policy.extensions.join("/"),
            })?;
        debug!("Found primary {} in archive", found.display());

        let mut sources = vec![found.clone()];
        if DescriptorKind::from_path(&found).is_some() {
            let set = resolve_dependents(&found).await?;
            sources.extend(check_dependents(&set).await?);
        }
        ensure_unique_names(&sources)?;

        // Flatten: move the primary and its dependents to the staging root.
        for source in &sources {
            let dest = area.root().join(file_name(source)?);
            tokio::fs::rename(source, &dest)
                .await
                .map_err(|e| StagingError::copy_failed(source.clone(), dest.clone(), e))?;
            area.add_file(dest);
        }

        let primary = area.root().join(file_name(&found)?);
        area.set_primary(primary.clone());
        Ok(primary)
    }
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr, StagingError> {
    path.file_name().ok_or_else(|| StagingError::InputNotFound {
        path: path.to_path_buf(),
    })
}

fn ensure_unique_names(sources: &[PathBuf]) -> Result<(), StagingError> {
    let mut seen = HashSet::new();
    for source in sources {
        let name = file_name(source)?;
        if !seen.insert(name.to_os_string()) {
            return Err(StagingError::NameCollision {
                name: name.to_string_lossy().into_owned(),
            });
        }
    }
    Ok(())
}
