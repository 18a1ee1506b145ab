//! Socket event handling.

use std::sync::Arc;
use std::time::Duration;

use lanyard_common::ConnectionError;
use tracing::{debug, info, warn};

use super::connection::Shared;
use crate::presence::PresenceSnapshot;
use crate::protocol::{self, Envelope, Inbound};
use crate::state::ConnectionPhase;
use crate::transport::SocketEvent;

impl Shared {
    /// Route one event from the socket tagged `generation`.
    pub(crate) fn handle_socket_event(self: &Arc<Self>, generation: u64, event: SocketEvent) {
        let guard = self.lock();
        let live = guard.borrow().live_socket(generation).is_some();
        if !live {
            debug!(generation, ?event, "Dropping event from stale socket");
            return;
        }

        match event {
            SocketEvent::Open => self.on_open(),
            SocketEvent::Message(text) => self.on_message(generation, &text),
            SocketEvent::Close => self.on_close(generation),
            SocketEvent::Error(message) => self.on_error(&message),
        }
    }

    fn on_open(&self) {
        let guard = self.lock();
        if let Some(socket) = guard.borrow_mut().socket.as_mut() {
            socket.open = true;
        }

        info!(user_id = %self.config.user_id, "Connected to Lanyard");
        self.update(|s| {
            s.is_connected = true;
            s.reconnect_attempts = 0;
            s.phase = ConnectionPhase::Connected;
        });
        self.hooks.connected();
    }

    fn on_message(self: &Arc<Self>, generation: u64, text: &str) {
        match protocol::decode(text) {
            Ok(Inbound::Hello { heartbeat_interval }) => {
                self.send_initialize(generation);
                match heartbeat_interval.filter(|ms| *ms > 0) {
                    Some(ms) => self.start_heartbeat(Duration::from_millis(ms)),
                    None => debug!("Hello without a heartbeat interval"),
                }
            }
            Ok(Inbound::Presence { kind, snapshot }) => {
                let snapshot: Option<Arc<PresenceSnapshot>> = snapshot.map(Arc::from);
                match &snapshot {
                    Some(p) => debug!(
                        ?kind,
                        status = p.discord_status.as_str(),
                        activities = p.activities.len(),
                        "Presence received"
                    ),
                    None => debug!(?kind, "Presence event without a payload"),
                }
                let data = snapshot.clone();
                self.update(move |s| {
                    s.data = data;
                    s.is_loading = false;
                });
                if let Some(snapshot) = &snapshot {
                    self.hooks.presence_updated(snapshot);
                }
            }
            Ok(Inbound::Ignored { op, t }) => {
                debug!(op, t = ?t, "Ignoring Lanyard message");
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse Lanyard message");
            }
        }
    }

    fn send_initialize(&self, generation: u64) {
        let guard = self.lock();
        let core = guard.borrow();
        let Some(socket) = core.live_socket(generation).filter(|s| s.open) else {
            debug!("Hello on a socket that is not open, not subscribing");
            return;
        };
        if let Ok(json) = Envelope::initialize(&self.config.user_id).to_json() {
            socket.send(json);
            debug!(user_id = %self.config.user_id, "Subscribed to presence");
        }
    }

    fn on_close(self: &Arc<Self>, generation: u64) {
        let guard = self.lock();
        guard.borrow_mut().socket = None;

        info!("Lanyard connection closed");
        self.update(|s| {
            s.is_connected = false;
            s.phase = ConnectionPhase::Idle;
        });
        self.hooks.disconnected();

        {
            let mut core = guard.borrow_mut();
            // Callbacks above may have disconnected, reconnected or destroyed.
            if core.generation != generation || core.destroyed {
                return;
            }
            core.cancel_timers();
        }
        self.schedule_reconnect();
    }

    fn on_error(&self, message: &str) {
        warn!(error = %message, "Lanyard socket error");
        let error = ConnectionError::Socket;
        self.update(|s| s.error = Some(error.clone()));
        self.hooks.errored(&error);
    }
}
