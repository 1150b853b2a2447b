//! Configuration for the placer module.

use serde::{Deserialize, Serialize};

/// Configuration for the file system placer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacerConfig {
    /// Highest numeric suffix tried before giving up on a free name.
    #[serde(default = "default_max_suffix")]
    pub max_suffix: u32,

    /// Buffer size for cross-device copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Whether to create a missing destination directory.
    #[serde(default = "default_true")]
    pub create_parents: bool,
}

fn default_max_suffix() -> u32 {
    999
}

fn default_buffer_size() -> usize {
    8 * 1024 * 1024 // 8 MB
}

fn default_true() -> bool {
    true
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            max_suffix: default_max_suffix(),
            buffer_size: default_buffer_size(),
            create_parents: true,
        }
    }
}

impl PlacerConfig {
    /// Sets the suffix cap.
    pub fn with_max_suffix(mut self, max: u32) -> Self {
        self.max_suffix = max;
        self
    }

    /// Sets the buffer size for copies.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Enables or disables destination directory creation.
    pub fn with_create_parents(mut self, enabled: bool) -> Self {
        self.create_parents = enabled;
        self
    }
}
