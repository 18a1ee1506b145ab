//! Observable presence store.
//!
//! Wraps a [`ConnectionManager`] for UI code that prefers to await changes
//! rather than register callbacks. Every state change is republished on a
//! [`tokio::sync::watch`] channel. The store connects when created and
//! destroys the manager when dropped.

use tokio::sync::watch;
use tracing::debug;

use lanyard_config::ClientConfig;

use crate::manager::{ConnectionManager, Hooks, Subscription};
use crate::state::ConnectionState;

pub struct PresenceStore {
    manager: ConnectionManager,
    subscription: Subscription,
    state_rx: watch::Receiver<ConnectionState>,
}

impl PresenceStore {
    /// Create a store for `config` and start connecting.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_manager(ConnectionManager::new(config))
    }

    pub fn with_hooks(config: ClientConfig, hooks: Hooks) -> Self {
        Self::with_manager(ConnectionManager::with_hooks(config, hooks))
    }

    /// Adopt an existing manager. The store takes over its lifecycle.
    pub fn with_manager(manager: ConnectionManager) -> Self {
        let (state_tx, state_rx) = watch::channel(manager.state());
        let subscription = manager.subscribe(move |state| {
            state_tx.send_replace(state.clone());
        });
        manager.connect();

        Self {
            manager,
            subscription,
            state_rx,
        }
    }

    /// Latest published state.
    pub fn state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    /// A receiver that wakes on every state change.
    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub fn reconnect(&self) {
        self.manager.reconnect();
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }
}

impl Drop for PresenceStore {
    fn drop(&mut self) {
        debug!("Presence store dropped, tearing down connection");
        // Destroy first so watchers receive the final idle state.
        self.manager.destroy();
        self.subscription.unsubscribe();
    }
}

impl std::fmt::Debug for PresenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceStore")
            .field("state", &*self.state_rx.borrow())
            .finish()
    }
}
