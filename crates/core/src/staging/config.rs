//! Configuration for the staging module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where staging directories are created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Parent of all per-job staging directories.
    #[serde(default = "default_temp_root")]
    pub temp_root: PathBuf,
}

fn default_temp_root() -> PathBuf {
    std::env::temp_dir().join("ozconv")
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            temp_root: default_temp_root(),
        }
    }
}

impl StagingConfig {
    /// Sets the temp root.
    pub fn with_temp_root(mut self, path: PathBuf) -> Self {
        self.temp_root = path;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StagingConfig::default();
        assert!(config.temp_root.ends_with("ozconv"));
        assert!(config.temp_root.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_config_builder() {
        let config = StagingConfig::default().with_temp_root(PathBuf::from("/scratch"));
        assert_eq!(config.temp_root, PathBuf::from("/scratch"));
    }
}
