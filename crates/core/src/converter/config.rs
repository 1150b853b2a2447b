//! Configuration for the converter module.

use serde::{Deserialize, Serialize};

/// Settings shared by every conversion routine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Passed to chdman as `--numprocessors`. `None` lets chdman decide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_processors: Option<u32>,

    /// Add `--fix` to the verify pass that runs before CHD extraction.
    #[serde(default)]
    pub verify_fix: bool,

    /// Run `chdman verify` before every CHD extraction.
    #[serde(default = "default_true")]
    pub verify_before_extract: bool,

    /// Run `7za t` on a freshly repacked archive.
    #[serde(default = "default_true")]
    pub validate_after_repack: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            num_processors: None,
            verify_fix: false,
            verify_before_extract: true,
            validate_after_repack: true,
        }
    }
}

impl ConverterConfig {
    /// Sets the chdman processor count.
    pub fn with_num_processors(mut self, count: u32) -> Self {
        self.num_processors = Some(count);
        self
    }

    /// Enables or disables the verify pass before extraction.
    pub fn with_verify_before_extract(mut self, enabled: bool) -> Self {
        self.verify_before_extract = enabled;
        self
    }

    /// Enables or disables archive validation after repacking.
    pub fn with_repack_validation(mut self, enabled: bool) -> Self {
        self.validate_after_repack = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConverterConfig::default();
        assert!(config.num_processors.is_none());
        assert!(!config.verify_fix);
        assert!(config.verify_before_extract);
        assert!(config.validate_after_repack);
    }

    #[test]
    fn test_config_builder() {
        let config = ConverterConfig::default()
            .with_num_processors(8)
            .with_verify_before_extract(false)
            .with_repack_validation(false);

        assert_eq!(config.num_processors, Some(8));
        assert!(!config.verify_before_extract);
        assert!(!config.validate_after_repack);
    }
}
