//! Lanyard client configuration.
//!
//! TOML-based configuration with validation. All sections use defaults so
//! partial configs work out of the box.
//!
//! ```rust,no_run
//! use lanyard_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    ClientConfig, LanyardConfig, LogLevel, LoggingConfig, DEFAULT_MAX_RECONNECT_ATTEMPTS,
    DEFAULT_WEBSOCKET_URL,
};

use lanyard_common::ConfigError;
use std::path::Path;

/// Load config from `path` if given, otherwise from the platform default
/// location (creating a commented default file when none exists).
pub fn load_config_from(path: Option<&Path>) -> Result<LanyardConfig, ConfigError> {
    match path {
        Some(path) => toml_loader::load_from_path(path),
        None => toml_loader::load_default(),
    }
}

/// Load config from the platform default path.
pub fn load_config() -> Result<LanyardConfig, ConfigError> {
    load_config_from(None)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &LanyardConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let json = config_to_json(&LanyardConfig::default());
        assert!(json.contains("\"client\""));
        assert!(json.contains("\"logging\""));
        assert!(json.contains("\"wss://api.lanyard.rest/socket\""));
    }

    #[test]
    fn load_config_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[client]\nuser_id = \"42\"\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.client.user_id, "42");
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let json = config_to_json(&LanyardConfig::default());
        let parsed: LanyardConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.client, ClientConfig::default());
    }
}
