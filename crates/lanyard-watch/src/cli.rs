use std::path::PathBuf;

use clap::Parser;
use lanyard_common::{ConfigError, LanyardError};
use lanyard_config::LanyardConfig;

/// Follow one Discord user's presence through the Lanyard relay.
#[derive(Parser, Debug)]
#[command(name = "lanyard-watch", version, about)]
pub struct Args {
    /// Discord user id to track. Falls back to `client.user_id` in the config.
    pub user_id: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// WebSocket endpoint override.
    #[arg(long)]
    pub url: Option<String>,

    /// Reconnect attempts before giving up.
    #[arg(long)]
    pub max_reconnect_attempts: Option<u32>,

    /// Do not reconnect after the socket closes.
    #[arg(long)]
    pub no_auto_reconnect: bool,

    /// Keep going after the reconnect budget runs out, retrying every 30s.
    #[arg(long)]
    pub retry_forever: bool,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}

impl Args {
    /// Layer command-line values over the loaded config.
    pub fn apply_overrides(&self, config: &mut LanyardConfig) {
        if let Some(user_id) = &self.user_id {
            config.client.user_id = user_id.clone();
        }
        if let Some(url) = &self.url {
            config.client.websocket_url = url.clone();
        }
        if let Some(max) = self.max_reconnect_attempts {
            config.client.max_reconnect_attempts = max;
        }
        if self.no_auto_reconnect {
            config.client.auto_reconnect = false;
        }
    }

    /// Settle the config to run with.
    ///
    /// A load failure is fatal only when `--config` named the file;
    /// otherwise the defaults stand in. Overrides are applied before the
    /// connect-time validation.
    pub fn resolve_config(
        &self,
        loaded: Result<LanyardConfig, ConfigError>,
    ) -> lanyard_common::Result<LanyardConfig> {
        let mut config = match loaded {
            Ok(config) => config,
            Err(e) if self.config.is_some() => return Err(e.into()),
            Err(e) => {
                tracing::warn!("Config load failed, using defaults: {e}");
                LanyardConfig::default()
            }
        };
        self.apply_overrides(&mut config);
        lanyard_config::validation::validate_for_connect(&config)?;
        Ok(config)
    }
}

/// Process exit status for a failed run: 2 for bad configuration, 1 otherwise.
pub fn exit_status(err: &LanyardError) -> u8 {
    match err {
        LanyardError::Config(_) => 2,
        LanyardError::Connection(_) | LanyardError::Io(_) => 1,
    }
}
