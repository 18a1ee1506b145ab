//! Hooks and listener types for the connection manager.

use std::sync::Arc;

use lanyard_common::ConnectionError;

use crate::presence::PresenceSnapshot;
use crate::state::ConnectionState;

pub(crate) type Listener = Arc<dyn Fn(&ConnectionState) + Send + Sync>;

type UnitHook = Arc<dyn Fn() + Send + Sync>;
type PresenceHook = Arc<dyn Fn(&PresenceSnapshot) + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&ConnectionError) + Send + Sync>;

/// Optional callbacks fired alongside state changes.
///
/// Hooks run after subscribers have seen the corresponding state.
#[derive(Clone, Default)]
pub struct Hooks {
    on_connect: Option<UnitHook>,
    on_disconnect: Option<UnitHook>,
    on_presence_update: Option<PresenceHook>,
    on_error: Option<ErrorHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_connect = Some(Arc::new(f));
        self
    }

    pub fn on_disconnect(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_disconnect = Some(Arc::new(f));
        self
    }

    pub fn on_presence_update(
        mut self,
        f: impl Fn(&PresenceSnapshot) + Send + Sync + 'static,
    ) -> Self {
        self.on_presence_update = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&ConnectionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub(crate) fn connected(&self) {
        if let Some(f) = &self.on_connect {
            f();
        }
    }

    pub(crate) fn disconnected(&self) {
        if let Some(f) = &self.on_disconnect {
            f();
        }
    }

    pub(crate) fn presence_updated(&self, snapshot: &PresenceSnapshot) {
        if let Some(f) = &self.on_presence_update {
            f(snapshot);
        }
    }

    pub(crate) fn errored(&self, error: &ConnectionError) {
        if let Some(f) = &self.on_error {
            f(error);
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .field("on_presence_update", &self.on_presence_update.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
