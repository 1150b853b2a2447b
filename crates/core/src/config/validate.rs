use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Tool paths are not empty
/// - Invoker timeout, when set, is not 0
/// - Placement suffix cap is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    for (name, path) in config.tools.entries() {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "tools.{} cannot be empty",
                name
            )));
        }
    }

    if let Some(trash) = &config.tools.trash {
        if trash.is_empty() || trash[0].is_empty() {
            return Err(ConfigError::ValidationError(
                "tools.trash must name a program".to_string(),
            ));
        }
    }

    if config.invoker.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "invoker.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.converter.num_processors == Some(0) {
        return Err(ConfigError::ValidationError(
            "converter.num_processors cannot be 0".to_string(),
        ));
    }

    if config.placement.max_suffix == 0 {
        return Err(ConfigError::ValidationError(
            "placement.max_suffix cannot be 0".to_string(),
        ));
    }

    Ok(())
}
