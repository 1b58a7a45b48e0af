//! Engine configuration persisted between runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Tunables for the hotbar engine.
///
/// Loaded through `confy` by `hotbar-core`; every field has a default so an
/// older config file keeps working after new fields are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long a forced slot restore swallows its echoed slot-select
    pub suppress_window_ms: u64,

    /// Append the error text to the "[handler] tag" line a failing handler
    /// sends the player
    pub show_error_details: bool,

    /// Root directory of the base definitions
    pub definitions_root: Option<PathBuf>,

    /// Index document inside `definitions_root`
    pub base_index: String,

    /// Directory holding one sub-directory per contribution pack
    pub contributions_root: Option<PathBuf>,

    /// File name of the pack document inside each contribution directory
    pub contribution_file: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            suppress_window_ms: 250,
            show_error_details: false,
            definitions_root: None,
            base_index: "index.json".to_string(),
            contributions_root: None,
            contribution_file: "hotbar.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig = toml::from_str("suppress_window_ms = 400").unwrap();
        assert_eq!(config.suppress_window_ms, 400);
        assert!(!config.show_error_details);
        assert_eq!(config.base_index, "index.json");
        assert_eq!(config.definitions_root, None);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = EngineConfig {
            definitions_root: Some(PathBuf::from("/srv/hotbar/defs")),
            show_error_details: true,
            ..Default::default()
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
