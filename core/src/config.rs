//! Engine configuration loading.
//!
//! The config file lives in the platform config directory under the `hotbar`
//! app name and is created with defaults on first run.

use chrono::Duration;
use hotbar_types::EngineConfig;

use crate::error::ConfigError;

const APP_NAME: &str = "hotbar";

/// Behavior attached to the plain config data.
pub trait EngineConfigExt {
    /// Suppression window as a chrono duration
    fn suppress_window(&self) -> Duration;
    fn save(&self);
}

impl EngineConfigExt for EngineConfig {
    fn suppress_window(&self) -> Duration {
        Duration::milliseconds(self.suppress_window_ms.min(i64::MAX as u64) as i64)
    }

    fn save(&self) {
        if let Err(e) = confy::store(APP_NAME, None, self) {
            tracing::warn!(error = %e, "Failed to save engine config");
        }
    }
}

/// Load the engine config from disk.
pub fn load_config() -> Result<EngineConfig, ConfigError> {
    Ok(confy::load(APP_NAME, None)?)
}

/// Load the engine config, falling back to defaults on any error.
pub fn load_config_or_default() -> EngineConfig {
    match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Using default engine config");
            EngineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppress_window_default() {
        let config = EngineConfig::default();
        assert_eq!(config.suppress_window(), Duration::milliseconds(250));
    }
}
