//! File system placer implementation.

use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info, warn};

use super::config::PlacerConfig;
use super::error::PlacementError;

/// Track sheets whose file references follow a renamed group.
const SHEET_EXTENSIONS: &[&str] = &["cue", "gdi", "toc"];

/// A quoted name or a bare token on a sheet line.
static SHEET_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""[^"]*"|[^\s"]+"#).expect("valid regex"));

/// Moves artifacts out of a staging area into their destination directory.
pub struct FsPlacer {
    config: PlacerConfig,
}

impl FsPlacer {
    /// Creates a new file system placer with the given configuration.
    pub fn new(config: PlacerConfig) -> Self {
        Self { config }
    }

    /// Creates a placer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PlacerConfig::default())
    }

    /// Moves `artifact` (a file or directory) into `dest_dir` and returns the
    /// final path.
    ///
    /// With `overwrite` an existing entry of the same name is replaced
    /// atomically. Without it the artifact gets the first free name of
    /// `name_1.ext`, `name_2.ext`, ... up to `max_suffix`.
    pub async fn place(
        &self,
        artifact: &Path,
        dest_dir: &Path,
        overwrite: bool,
    ) -> Result<PathBuf, PlacementError> {
        let (name, is_dir) = inspect(artifact).await?;

        self.ensure_dest_dir(dest_dir).await?;

        let target = dest_dir.join(&name);
        let final_path = if overwrite {
            if exists(&target).await? {
                self.replace(artifact, &target, is_dir).await?;
            } else {
                self.move_entry(artifact, &target, is_dir).await?;
            }
            target
        } else {
            let n = self.free_suffix(dest_dir, std::slice::from_ref(&name)).await?;
            let free = dest_dir.join(suffixed_name(&name, n));
            self.move_entry(artifact, &free, is_dir).await?;
            free
        };

        info!("Placed {} at {}", artifact.display(), final_path.display());
        Ok(final_path)
    }

    /// Places a primary artifact and its companions (the first path is the
    /// primary) under one shared suffix, so a placed `game.cue` never sits
    /// next to an unrelated `game.bin`.
    ///
    /// When a suffix is needed and the primary is a CUE, GDI or TOC sheet,
    /// its references to the companions are rewritten to the new names
    /// before anything is moved.
    pub async fn place_group(
        &self,
        artifacts: &[PathBuf],
        dest_dir: &Path,
        overwrite: bool,
    ) -> Result<Vec<PathBuf>, PlacementError> {
        let mut placed = Vec::with_capacity(artifacts.len());
        if artifacts.len() <= 1 || overwrite {
            for artifact in artifacts {
                placed.push(self.place(artifact, dest_dir, overwrite).await?);
            }
            return Ok(placed);
        }

        let mut entries = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            entries.push(inspect(artifact).await?);
        }
        self.ensure_dest_dir(dest_dir).await?;

        let names: Vec<OsString> = entries.iter().map(|(name, _)| name.clone()).collect();
        let n = self.free_suffix(dest_dir, &names).await?;
        if n > 0 {
            self.rewrite_references(&artifacts[0], &names[1..], n).await?;
        }

        for (artifact, (name, is_dir)) in artifacts.iter().zip(&entries) {
            let target = dest_dir.join(suffixed_name(name, n));
            self.move_entry(artifact, &target, *is_dir).await?;
            info!("Placed {} at {}", artifact.display(), target.display());
            placed.push(target);
        }
        Ok(placed)
    }

    async fn ensure_dest_dir(&self, dir: &Path) -> Result<(), PlacementError> {
        if exists(dir).await? {
            return Ok(());
        }
        if !self.config.create_parents {
            return Err(PlacementError::DestinationMissing {
                path: dir.to_path_buf(),
            });
        }
        fs::create_dir_all(dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                PlacementError::PermissionDenied {
                    path: dir.to_path_buf(),
                }
            } else {
                PlacementError::DirectoryCreationFailed {
                    path: dir.to_path_buf(),
                    error: e,
                }
            }
        })
    }

    /// Smallest `n` up to `max_suffix` for which every name, suffixed with
    /// `n`, is absent from `dir`. Zero means the plain names are free.
    async fn free_suffix(&self, dir: &Path, names: &[OsString]) -> Result<u32, PlacementError> {
        'candidates: for n in 0..=self.config.max_suffix {
            for name in names {
                if exists(&dir.join(suffixed_name(name, n))).await? {
                    continue 'candidates;
                }
            }
            if n > 0 {
                debug!(
                    "{} taken in {}, using suffix _{}",
                    names[0].to_string_lossy(),
                    dir.display(),
                    n
                );
            }
            return Ok(n);
        }
        Err(PlacementError::NamesExhausted {
            path: dir.join(&names[0]),
            max_suffix: self.config.max_suffix,
        })
    }

    /// Points the sheet's references to `companions` at their `_n` names.
    async fn rewrite_references(
        &self,
        sheet: &Path,
        companions: &[OsString],
        n: u32,
    ) -> Result<(), PlacementError> {
        let is_sheet = sheet
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| SHEET_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if !is_sheet {
            return Ok(());
        }

        let text = match fs::read_to_string(sheet).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                warn!(
                    "{} is not UTF-8; its file references keep their old names",
                    sheet.display()
                );
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let renames: Vec<(String, String)> = companions
            .iter()
            .map(|name| {
                (
                    name.to_string_lossy().into_owned(),
                    suffixed_name(name, n).to_string_lossy().into_owned(),
                )
            })
            .collect();

        let rewritten = rename_references(&text, &renames);
        if rewritten != text {
            fs::write(sheet, rewritten).await?;
            debug!("Rewrote file references in {}", sheet.display());
        }
        Ok(())
    }

    /// Replaces `target` with `source` via a hidden temp name in the
    /// destination directory, so the target is never half-written.
    async fn replace(
        &self,
        source: &Path,
        target: &Path,
        is_dir: bool,
    ) -> Result<(), PlacementError> {
        let mut temp_name = OsString::from(".");
        temp_name.push(target.file_name().unwrap_or_default());
        temp_name.push(".ozconv-tmp");
        let temp = target.with_file_name(temp_name);

        if exists(&temp).await? {
            remove_entry(&temp).await?;
        }
        self.move_entry(source, &temp, is_dir).await?;

        // rename() only replaces files; an existing directory has to go first.
        let target_is_dir = fs::symlink_metadata(target)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if is_dir || target_is_dir {
            if let Err(e) = remove_entry(target).await {
                let _ = remove_entry(&temp).await;
                return Err(PlacementError::move_failed(
                    source.to_path_buf(),
                    target.to_path_buf(),
                    e,
                ));
            }
        }

        if let Err(e) = fs::rename(&temp, target).await {
            let _ = remove_entry(&temp).await;
            return Err(PlacementError::move_failed(
                source.to_path_buf(),
                target.to_path_buf(),
                e,
            ));
        }
        debug!("Replaced {}", target.display());
        Ok(())
    }

    /// Renames `source` to `destination`, copying across filesystems.
    async fn move_entry(
        &self,
        source: &Path,
        destination: &Path,
        is_dir: bool,
    ) -> Result<(), PlacementError> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(()),
            Err(e) if is_cross_device(&e) => {
                debug!(
                    "Cross-device move of {}, copying instead",
                    source.display()
                );
                let copied = if is_dir {
                    self.copy_tree(source, destination).await
                } else {
                    self.copy_file(source, destination).await.map(|_| ())
                };
                if let Err(e) = copied {
                    let _ = remove_entry(destination).await;
                    return Err(PlacementError::move_failed(
                        source.to_path_buf(),
                        destination.to_path_buf(),
                        e,
                    ));
                }
                remove_entry(source).await.map_err(|e| {
                    PlacementError::move_failed(source.to_path_buf(), destination.to_path_buf(), e)
                })
            }
            Err(e) => Err(PlacementError::move_failed(
                source.to_path_buf(),
                destination.to_path_buf(),
                e,
            )),
        }
    }

    /// Buffered copy of one file.
    async fn copy_file(&self, source: &Path, destination: &Path) -> std::io::Result<u64> {
        let source_file = File::open(source).await?;
        let dest_file = File::create(destination).await?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut total_bytes = 0u64;

        loop {
            let bytes_read = reader.read(&mut buffer).await?;
            if bytes_read == 0 {
                break;
            }
            writer.write_all(&buffer[..bytes_read]).await?;
            total_bytes += bytes_read as u64;
        }
        writer.flush().await?;
        Ok(total_bytes)
    }

    async fn copy_tree(&self, source: &Path, destination: &Path) -> std::io::Result<()> {
        let mut pending = vec![(source.to_path_buf(), destination.to_path_buf())];
        while let Some((from, to)) = pending.pop() {
            fs::create_dir_all(&to).await?;
            let mut entries = fs::read_dir(&from).await?;
            while let Some(entry) = entries.next_entry().await? {
                let child_to = to.join(entry.file_name());
                if entry.file_type().await?.is_dir() {
                    pending.push((entry.path(), child_to));
                } else {
                    self.copy_file(&entry.path(), &child_to).await?;
                }
            }
        }
        Ok(())
    }
}

/// Name and kind of a staged artifact.
async fn inspect(artifact: &Path) -> Result<(OsString, bool), PlacementError> {
    let meta = match fs::symlink_metadata(artifact).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PlacementError::SourceNotFound {
                path: artifact.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    let name = artifact
        .file_name()
        .ok_or_else(|| PlacementError::SourceNotFound {
            path: artifact.to_path_buf(),
        })?;
    Ok((name.to_os_string(), meta.is_dir()))
}

/// Replaces sheet tokens naming an old file, quoted or bare, with its new name.
fn rename_references(text: &str, renames: &[(String, String)]) -> String {
    SHEET_TOKEN
        .replace_all(text, |caps: &Captures<'_>| {
            let token = &caps[0];
            let quoted = token.len() >= 2 && token.starts_with('"');
            let bare = if quoted {
                &token[1..token.len() - 1]
            } else {
                token
            };
            match renames.iter().find(|(old, _)| old == bare) {
                Some((_, new)) if quoted => format!("\"{}\"", new),
                Some((_, new)) => new.clone(),
                None => token.to_string(),
            }
        })
        .into_owned()
}

/// `game.chd` -> `game_3.chd`; `game` -> `game_3`. Zero leaves the name alone.
fn suffixed_name(name: &OsStr, n: u32) -> OsString {
    if n == 0 {
        return name.to_os_string();
    }
    let path = Path::new(name);
    let mut out = OsString::new();
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => {
            out.push(stem);
            out.push(format!("_{}.", n));
            out.push(ext);
        }
        _ => {
            out.push(name);
            out.push(format!("_{}", n));
        }
    }
    out
}

fn is_cross_device(e: &std::io::Error) -> bool {
    // EXDEV is 18 on Linux and macOS.
    e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18)
}

async fn exists(path: &Path) -> std::io::Result<bool> {
    match fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

async fn remove_entry(path: &Path) -> std::io::Result<()> {
    if fs::symlink_metadata(path).await?.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    }
}
