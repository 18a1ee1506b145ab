//! Public handle to the connection manager.

use std::fmt;
use std::sync::{Arc, Weak};

use lanyard_config::ClientConfig;

use super::connection::Shared;
use super::types::Hooks;
use crate::state::ConnectionState;
use crate::transport::{Connector, WsConnector};

/// Keeps one Lanyard socket alive for one user and fans its state out to
/// subscribers.
///
/// Cheap to clone; clones share the same connection. Methods that start
/// work (`connect`, `reconnect`) must be called from inside a tokio
/// runtime. When the last handle is dropped every socket and timer is torn
/// down.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_hooks(config, Hooks::default())
    }

    pub fn with_hooks(config: ClientConfig, hooks: Hooks) -> Self {
        Self::with_connector(config, hooks, Arc::new(WsConnector::default()))
    }

    /// Build a manager that opens sockets through `connector`.
    pub fn with_connector(
        config: ClientConfig,
        hooks: Hooks,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared::new(config, hooks, connector)),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Open a fresh socket, replacing any existing one.
    ///
    /// Connection failures are reported through state and the `on_error`
    /// hook, never returned.
    pub fn connect(&self) {
        self.shared.connect();
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Register `listener` for every state change.
    ///
    /// The listener is called once with the current state before this
    /// returns.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ConnectionState) + Send + Sync + 'static,
    {
        let id = self.shared.add_listener(Arc::new(listener));
        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Reset the attempt counter and connect again.
    pub fn reconnect(&self) {
        self.shared.reconnect();
    }

    /// Close the socket and cancel pending timers. No reconnect follows.
    pub fn disconnect(&self) {
        self.shared.disconnect();
    }

    /// Disconnect and drop every subscriber. Later lifecycle calls are no-ops.
    pub fn destroy(&self) {
        self.shared.destroy();
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.is_destroyed()
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("config", &self.shared.config)
            .field("hooks", &self.shared.hooks)
            .field("state", &self.state())
            .finish()
    }
}

/// Handle returned by [`ConnectionManager::subscribe`].
///
/// Dropping it does not unsubscribe.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: Option<u64>,
    shared: Weak<Shared>,
}

impl Subscription {
    /// Stop receiving updates. Safe to call more than once.
    pub fn unsubscribe(&self) {
        if let (Some(id), Some(shared)) = (self.id, self.shared.upgrade()) {
            shared.remove_listener(id);
        }
    }
}
