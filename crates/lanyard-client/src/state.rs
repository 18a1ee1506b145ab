//! Connection state published to subscribers.

use std::sync::Arc;

use lanyard_common::ConnectionError;

use crate::presence::PresenceSnapshot;

/// Coarse phase of the connection state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Not connected and not trying to be.
    #[default]
    Idle,
    /// A socket has been requested and is not open yet.
    Connecting,
    Connected,
    /// Waiting on the backoff timer before the next attempt.
    Reconnecting,
    /// Gave up; only a manual reconnect leaves this phase.
    Failed,
}

/// Snapshot of everything a UI needs to render the tracked presence.
///
/// Handed out by value; mutating a copy never affects the manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionState {
    /// Latest presence, replaced wholesale on every update.
    pub data: Option<Arc<PresenceSnapshot>>,
    pub is_connected: bool,
    /// True until the first snapshot arrives or a terminal error is set.
    pub is_loading: bool,
    pub error: Option<ConnectionError>,
    pub reconnect_attempts: u32,
    pub phase: ConnectionPhase,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            data: None,
            is_connected: false,
            is_loading: true,
            error: None,
            reconnect_attempts: 0,
            phase: ConnectionPhase::Idle,
        }
    }
}

impl ConnectionState {
    pub fn presence(&self) -> Option<&PresenceSnapshot> {
        self.data.as_deref()
    }

    /// True once the reconnect budget has been spent.
    pub fn has_given_up(&self) -> bool {
        matches!(self.error, Some(ConnectionError::MaxReconnectAttempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_loading() {
        let state = ConnectionState::default();
        assert!(state.is_loading);
        assert!(!state.is_connected);
        assert!(state.data.is_none());
        assert!(state.error.is_none());
        assert_eq!(state.reconnect_attempts, 0);
        assert_eq!(state.phase, ConnectionPhase::Idle);
    }

    #[test]
    fn copies_are_independent() {
        let original = ConnectionState::default();
        let mut copy = original.clone();
        copy.is_loading = false;
        copy.error = Some(ConnectionError::Socket);
        assert!(original.is_loading);
        assert!(original.error.is_none());
    }

    #[test]
    fn given_up_only_on_budget_exhaustion() {
        let mut state = ConnectionState::default();
        state.error = Some(ConnectionError::Socket);
        assert!(!state.has_given_up());
        state.error = Some(ConnectionError::MaxReconnectAttempts);
        assert!(state.has_given_up());
    }
}
