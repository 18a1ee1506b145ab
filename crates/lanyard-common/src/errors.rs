use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures surfaced through `ConnectionState::error`.
///
/// Cloned into every state snapshot handed to subscribers, so it carries
/// messages rather than source errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// The socket could not be constructed at all (bad URL, no runtime).
    #[error("Failed to connect: {0}")]
    Construction(String),

    /// The transport reported an error event.
    #[error("WebSocket connection error")]
    Socket,

    #[error("Maximum reconnection attempts reached. Please try again later.")]
    MaxReconnectAttempts,
}

/// Everything the watcher binary can fail with.
#[derive(Debug, thiserror::Error)]
pub enum LanyardError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
