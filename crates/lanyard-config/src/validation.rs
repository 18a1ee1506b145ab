//! Configuration validation.

use crate::schema::LanyardConfig;
use lanyard_common::ConfigError;

/// Upper bound on `client.max_reconnect_attempts`.
const MAX_RECONNECT_ATTEMPTS_LIMIT: u32 = 100;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &LanyardConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    // An empty id is allowed here; the caller must supply one before connecting.
    let user_id = &config.client.user_id;
    if !user_id.is_empty() && !user_id.chars().all(|c| c.is_ascii_digit()) {
        errors.push(format!(
            "client.user_id = {user_id:?} is not a Discord snowflake"
        ));
    }

    let url = &config.client.websocket_url;
    if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        errors.push(format!(
            "client.websocket_url = {url:?} must use ws:// or wss://"
        ));
    }

    validate_range(
        &mut errors,
        "client.max_reconnect_attempts",
        config.client.max_reconnect_attempts,
        0,
        MAX_RECONNECT_ATTEMPTS_LIMIT,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

/// Like [`validate`], but also requires a user id to be present.
pub fn validate_for_connect(config: &LanyardConfig) -> Result<(), ConfigError> {
    validate(config)?;
    if config.client.user_id.is_empty() {
        return Err(ConfigError::ValidationError(
            "client.user_id is required".into(),
        ));
    }
    Ok(())
}

fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = LanyardConfig::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn default_config_cannot_connect() {
        let config = LanyardConfig::default();
        let err = validate_for_connect(&config).unwrap_err().to_string();
        assert!(err.contains("client.user_id is required"));
    }

    #[test]
    fn catches_non_numeric_user_id() {
        let mut config = LanyardConfig::default();
        config.client.user_id = "alice".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("client.user_id"));
    }

    #[test]
    fn catches_http_url() {
        let mut config = LanyardConfig::default();
        config.client.websocket_url = "https://api.lanyard.rest/socket".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("client.websocket_url"));
    }

    #[test]
    fn accepts_plain_ws_url() {
        let mut config = LanyardConfig::default();
        config.client.user_id = "94490510688792576".into();
        config.client.websocket_url = "ws://127.0.0.1:4001/socket".into();
        assert!(validate_for_connect(&config).is_ok());
    }

    #[test]
    fn catches_too_many_attempts() {
        let mut config = LanyardConfig::default();
        config.client.max_reconnect_attempts = 1000;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("client.max_reconnect_attempts"));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = LanyardConfig::default();
        config.client.user_id = "x".into();
        config.client.websocket_url = "ftp://nope".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("client.user_id"));
        assert!(err.contains("client.websocket_url"));
        assert!(err.contains("; "));
    }
}
