//! Live Discord presence from the Lanyard relay.
//!
//! [`ConnectionManager`] keeps one socket open for one user and publishes
//! every state change; [`PresenceStore`] wraps it in a watch channel for
//! UI code. The [`format`] helpers turn presence fields into display
//! strings.

pub mod backoff;
pub mod format;
pub mod manager;
pub mod presence;
pub mod protocol;
pub mod state;
pub mod store;
pub mod transport;

pub use manager::{ConnectionManager, Hooks, Subscription};
pub use presence::{
    Activity, ActivityType, DiscordStatus, DiscordUser, PresenceSnapshot, SpotifyTrack,
};
pub use state::{ConnectionPhase, ConnectionState};
pub use store::PresenceStore;
pub use transport::{Connector, WsConnector};

pub use lanyard_common::ConnectionError;
pub use lanyard_config::ClientConfig;
