//! Configuration for the invoker module.

use serde::{Deserialize, Serialize};

/// Configuration for running external tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokerConfig {
    /// Kill a tool after this many seconds. `None` means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Remove ANSI escape sequences from captured output.
    #[serde(default = "default_true")]
    pub strip_ansi: bool,
}

fn default_true() -> bool {
    true
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            strip_ansi: true,
        }
    }
}

impl InvokerConfig {
    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Enables or disables ANSI stripping.
    pub fn with_strip_ansi(mut self, enabled: bool) -> Self {
        self.strip_ansi = enabled;
        self
    }
}
