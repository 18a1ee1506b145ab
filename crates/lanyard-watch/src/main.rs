//! lanyard-watch: follow one Discord user's presence from the terminal.
//!
//! Connects to the Lanyard relay, prints a summary whenever the presence
//! or connection state changes, and exits on Ctrl-C.

mod cli;
mod render;

use std::process::ExitCode;
use std::time::Duration;

use lanyard_client::{ClientConfig, ConnectionError, Hooks, PresenceStore};
use lanyard_common::LanyardError;
use tracing_subscriber::EnvFilter;

const RETRY_AFTER: Duration = Duration::from_secs(30);

fn init_tracing(level: &str) {
    let fallback = format!("lanyard_client={level},lanyard_watch={level}");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    let loaded = lanyard_config::load_config_from(args.config.as_deref());
    let level = args
        .log_level
        .clone()
        .or_else(|| {
            loaded
                .as_ref()
                .ok()
                .map(|c| c.logging.level.as_str().to_string())
        })
        .unwrap_or_else(|| "info".to_string());
    init_tracing(&level);

    tracing::info!("lanyard-watch v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match args.resolve_config(loaded) {
        Ok(config) => config,
        Err(e) => return fail(e),
    };

    match run(config.client, args.retry_forever).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn fail(err: LanyardError) -> ExitCode {
    tracing::error!("{err}");
    ExitCode::from(cli::exit_status(&err))
}

async fn run(client: ClientConfig, retry_forever: bool) -> lanyard_common::Result<()> {
    tracing::info!(
        user_id = %client.user_id,
        url = %client.websocket_url,
        max_reconnect_attempts = client.max_reconnect_attempts,
        auto_reconnect = client.auto_reconnect,
        "Watching presence"
    );

    let hooks = Hooks::new()
        .on_connect(|| tracing::info!("Socket open"))
        .on_disconnect(|| tracing::info!("Socket closed"))
        .on_error(|e| tracing::warn!(error = %e, "Connection error"));
    let store = PresenceStore::with_hooks(client, hooks);
    let mut state_rx = store.watch();

    let retry = tokio::time::sleep(Duration::ZERO);
    tokio::pin!(retry);
    let mut retry_armed = false;
    let mut last_summary = String::new();

    loop {
        tokio::select! {
            interrupted = tokio::signal::ctrl_c() => {
                interrupted?;
                tracing::info!("Interrupted, shutting down");
                break;
            }
            _ = &mut retry, if retry_armed => {
                retry_armed = false;
                tracing::info!("Retrying after giving up");
                store.reconnect();
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();

                let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
                let summary = render::summarize(&state, now);
                if summary != last_summary {
                    println!("{summary}");
                    last_summary = summary;
                }

                if state.has_given_up() && !retry_armed {
                    if !retry_forever {
                        return Err(state
                            .error
                            .unwrap_or(ConnectionError::MaxReconnectAttempts)
                            .into());
                    }
                    tracing::warn!("Reconnect budget spent, retrying in {:?}", RETRY_AFTER);
                    retry.as_mut().reset(tokio::time::Instant::now() + RETRY_AFTER);
                    retry_armed = true;
                }
            }
        }
    }

    drop(store);
    tracing::info!("Shutdown complete");
    Ok(())
}
