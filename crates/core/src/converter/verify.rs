//! Post-run checks on declared artifacts.

use std::path::{Path, PathBuf};

use super::error::ConversionError;

/// Checks that `path` is a regular file with non-zero size and returns the
/// size.
pub async fn verify_file(path: &Path) -> Result<u64, ConversionError> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => meta,
        Ok(_) => {
            return Err(ConversionError::ArtifactMissing {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConversionError::ArtifactMissing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    if meta.len() == 0 {
        return Err(ConversionError::ArtifactEmpty {
            path: path.to_path_buf(),
        });
    }
    Ok(meta.len())
}

/// Checks that `path` is a directory with at least one entry and returns the
/// number of top-level entries.
pub async fn verify_directory(path: &Path) -> Result<u64, ConversionError> {
    let mut entries = match tokio::fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConversionError::ArtifactMissing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    let mut count = 0;
    while entries.next_entry().await?.is_some() {
        count += 1;
    }
    if count == 0 {
        return Err(ConversionError::ArtifactEmpty {
            path: path.to_path_buf(),
        });
    }
    Ok(count)
}

/// Lists files in `dir` named `<base>*.<ext>` for any of `extensions`,
/// sorted by name.
pub async fn find_secondaries(
    dir: &Path,
    base: &str,
    extensions: &[&str],
) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(base) {
            continue;
        }
        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if matches_ext && entry.file_type().await?.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
