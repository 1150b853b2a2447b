//! Descriptor resolver for multi-file disc images.
//!
//! CUE sheets and GDI files are small text files that list the binary track
//! files making up a disc image. The pipeline needs that list to stage every
//! dependent file next to its descriptor and, after a successful job, to
//! delete them together with the descriptor.
//!
//! Parsing is lenient: malformed lines are skipped with a warning. Names are
//! returned in first-seen order with exact duplicates removed. Escaped quote
//! characters inside a quoted name are not supported.
//!
//! # Example
//!
//! ```ignore
//! use ozconv_core::descriptor::{resolve_dependents, check_dependents};
//!
//! let set = resolve_dependents(Path::new("/games/game.cue")).await?;
//! for path in check_dependents(&set).await? {
//!     println!("needs {}", path.display());
//! }
//! ```

mod cue;
mod error;
mod gdi;
mod types;

pub use cue::parse_cue;
pub use error::DescriptorError;
pub use gdi::parse_gdi;
pub use types::{DependentFileSet, DescriptorKind};

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Reads a descriptor file and returns the dependent file names it references.
pub async fn resolve_dependents(path: &Path) -> Result<DependentFileSet, DescriptorError> {
    let kind = DescriptorKind::from_path(path).ok_or_else(|| {
        DescriptorError::UnsupportedDescriptor {
            path: path.to_path_buf(),
        }
    })?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DescriptorError::read_failed(path.to_path_buf(), e))?;
    // Descriptor files in the wild are frequently not valid UTF-8.
    let text = String::from_utf8_lossy(&bytes);

    let names = match kind {
        DescriptorKind::Cue => parse_cue(&text),
        DescriptorKind::Gdi => parse_gdi(&text),
    };

    if names.is_empty() {
        warn!("Descriptor {} references no files", path.display());
    } else {
        debug!(
            "Descriptor {} references {} file(s)",
            path.display(),
            names.len()
        );
    }

    Ok(DependentFileSet::new(path.to_path_buf(), kind, names))
}

/// Checks that every dependent exists next to the descriptor.
///
/// Returns the resolved paths in descriptor order, or the first missing name.
pub async fn check_dependents(set: &DependentFileSet) -> Result<Vec<PathBuf>, DescriptorError> {
    let mut resolved = Vec::with_capacity(set.len());
    for (name, path) in set.names().iter().zip(set.paths()) {
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => resolved.push(path),
            _ => {
                return Err(DescriptorError::DependentNotFound {
                    descriptor: set.descriptor().to_path_buf(),
                    name: name.clone(),
                    expected: path,
                })
            }
        }
    }
    Ok(resolved)
}

/// Drops a leading UTF-8 byte order mark, as written by some disc tools.
fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Removes exact duplicates while keeping first-seen order.
fn dedup_in_order(names: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_resolve_cue_relative_to_descriptor_dir() {
        let dir = TempDir::new().unwrap();
        let cue = dir.path().join("game.cue");
        tokio::fs::write(&cue, "FILE \"game (Track 1).bin\" BINARY\n  TRACK 01 MODE2/2352\n")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("game (Track 1).bin"), b"data")
            .await
            .unwrap();

        let set = resolve_dependents(&cue).await.unwrap();
        assert_eq!(set.kind(), DescriptorKind::Cue);
        assert_eq!(set.names(), &["game (Track 1).bin".to_string()]);

        let paths = check_dependents(&set).await.unwrap();
        assert_eq!(paths, vec![dir.path().join("game (Track 1).bin")]);
    }

    #[tokio::test]
    async fn test_missing_dependent_is_reported() {
        let dir = TempDir::new().unwrap();
        let cue = dir.path().join("game.cue");
        tokio::fs::write(&cue, "FILE \"missing.bin\" BINARY\n")
            .await
            .unwrap();

        let set = resolve_dependents(&cue).await.unwrap();
        let err = check_dependents(&set).await.unwrap_err();
        match err {
            DescriptorError::DependentNotFound { name, expected, .. } => {
                assert_eq!(name, "missing.bin");
                assert_eq!(expected, dir.path().join("missing.bin"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_byte_order_mark_keeps_first_dependent() {
        let dir = TempDir::new().unwrap();
        let cue = dir.path().join("game.cue");
        tokio::fs::write(&cue, "\u{feff}FILE \"game.bin\" BINARY\n  TRACK 01 MODE2/2352\n")
            .await
            .unwrap();

        let set = resolve_dependents(&cue).await.unwrap();
        assert_eq!(set.names(), &["game.bin".to_string()]);
        assert!(matches!(
            check_dependents(&set).await,
            Err(DescriptorError::DependentNotFound { ref name, .. }) if name == "game.bin"
        ));

        let gdi = dir.path().join("disc.gdi");
        tokio::fs::write(&gdi, "\u{feff}1\n1 0 4 2352 track01.bin 0\n")
            .await
            .unwrap();
        let set = resolve_dependents(&gdi).await.unwrap();
        assert_eq!(set.names(), &["track01.bin".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_descriptor_gives_empty_set() {
        let dir = TempDir::new().unwrap();
        let gdi = dir.path().join("empty.gdi");
        tokio::fs::write(&gdi, "").await.unwrap();

        let set = resolve_dependents(&gdi).await.unwrap();
        assert!(set.is_empty());
        assert!(check_dependents(&set).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let result = resolve_dependents(Path::new("/tmp/game.iso")).await;
        assert!(matches!(
            result,
            Err(DescriptorError::UnsupportedDescriptor { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreadable_descriptor() {
        let dir = TempDir::new().unwrap();
        let result = resolve_dependents(&dir.path().join("absent.cue")).await;
        assert!(matches!(result, Err(DescriptorError::ReadFailed { .. })));
    }

    #[test]
    fn test_dedup_in_order() {
        let names = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(dedup_in_order(names), vec!["b".to_string(), "a".to_string()]);
    }
}
