use serde::{Deserialize, Serialize};

use crate::converter::ConverterConfig;
use crate::invoker::{InvokerConfig, ToolCatalog};
use crate::placer::PlacerConfig;
use crate::staging::StagingConfig;

/// Root configuration
///
/// Every section is optional; an empty file yields the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Paths of the external tools.
    #[serde(default)]
    pub tools: ToolCatalog,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub invoker: InvokerConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub placement: PlacerConfig,
}
