//! Types for the descriptor module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supported multi-file descriptor formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    Cue,
    Gdi,
}

impl DescriptorKind {
    /// Detects the descriptor kind from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "cue" => Some(Self::Cue),
            "gdi" => Some(Self::Gdi),
            _ => None,
        }
    }
}

/// The ordered, de-duplicated file names referenced by one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentFileSet {
    descriptor: PathBuf,
    kind: DescriptorKind,
    names: Vec<String>,
}

impl DependentFileSet {
    pub fn new(descriptor: PathBuf, kind: DescriptorKind, names: Vec<String>) -> Self {
        Self {
            descriptor,
            kind,
            names,
        }
    }

    pub fn descriptor(&self) -> &Path {
        &self.descriptor
    }

    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    /// Names exactly as written in the descriptor.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names resolved against the descriptor's own directory.
    pub fn paths(&self) -> Vec<PathBuf> {
        let base = self.descriptor.parent().unwrap_or_else(|| Path::new(""));
        self.names.iter().map(|name| base.join(name)).collect()
    }
}
