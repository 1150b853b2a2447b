//! Archive container helpers.

use std::path::{Path, PathBuf};

/// Extensions handled by the archive tool.
pub const ARCHIVE_EXTENSIONS: [&str; 4] = ["7z", "zip", "rar", "gz"];

/// Whether `path` names a supported archive container.
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            ARCHIVE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// File stem with a trailing `.tar` removed, so `game.tar.gz` gives `game`.
pub fn archive_stem(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy().into_owned();
    match stem.strip_suffix(".tar") {
        Some(inner) if !inner.is_empty() => Some(inner.to_string()),
        _ => Some(stem),
    }
}

/// Finds the preferred primary file in an extracted tree.
///
/// Extensions are tried in order; for each one the top level wins over
/// nested directories, and ties are broken by path.
pub async fn find_primary(root: &Path, extensions: &[&str]) -> std::io::Result<Option<PathBuf>> {
    let files = list_files(root).await?;

    for ext in extensions {
        let mut matches: Vec<&(usize, PathBuf)> = files
            .iter()
            .filter(|(_, path)| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case(ext))
                    .unwrap_or(false)
            })
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        if let Some((_, path)) = matches.first() {
            return Ok(Some(path.clone()));
        }
    }

    Ok(None)
}

/// Every regular file under `root`, paired with its depth (0 = top level).
async fn list_files(root: &Path) -> std::io::Result<Vec<(usize, PathBuf)>> {
    let mut files = Vec::new();
    let mut pending = vec![(0usize, root.to_path_buf())];

    while let Some((depth, dir)) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push((depth + 1, entry.path()));
            } else if file_type.is_file() {
                files.push((depth, entry.path()));
            }
        }
    }

    Ok(files)
}
