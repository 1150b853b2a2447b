//! Types for the staging module.

use std::path::Path;

use super::archive::is_archive;

/// How an archive input is staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveHandling {
    /// Archives are not valid input.
    Reject,
    /// Extract, then pick the primary file by extension.
    LocatePrimary,
    /// Extract; the whole extracted tree is the input.
    WholeTree,
}

/// What a conversion accepts as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPolicy {
    /// Accepted primary extensions, lowercase, in preference order.
    pub extensions: &'static [&'static str],
    pub archives: ArchiveHandling,
}

impl InputPolicy {
    pub const fn new(extensions: &'static [&'static str], archives: ArchiveHandling) -> Self {
        Self {
            extensions,
            archives,
        }
    }

    /// Whether `path` may be submitted for this conversion.
    pub fn accepts(&self, path: &Path) -> bool {
        if is_archive(path) {
            return self.archives != ArchiveHandling::Reject;
        }
        self.archives != ArchiveHandling::WholeTree && self.matches_extension(path)
    }

    /// Whether `path` has one of the accepted primary extensions.
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.extensions.iter().any(|accepted| *accepted == e)
            })
            .unwrap_or(false)
    }

    /// Human readable list of accepted extensions.
    pub fn describe(&self) -> String {
        let mut all: Vec<&str> = self.extensions.to_vec();
        if self.archives != ArchiveHandling::Reject {
            all.extend(super::archive::ARCHIVE_EXTENSIONS);
        }
        all.dedup();
        all.join(", ")
    }
}
