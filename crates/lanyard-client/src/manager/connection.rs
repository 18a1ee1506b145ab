//! Shared manager core: state, listeners, socket and timer lifecycle.
//!
//! Every transition runs under one re-entrant lock, the same way callbacks
//! run one at a time on an event loop. A callback may call back into the
//! manager (`state`, `disconnect`, `destroy`) on the same thread; the
//! `RefCell` borrow is never held while user code runs.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use lanyard_common::ConnectionError;
use lanyard_config::ClientConfig;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::types::{Hooks, Listener};
use crate::backoff::reconnect_delay;
use crate::protocol::Envelope;
use crate::state::{ConnectionPhase, ConnectionState};
use crate::transport::{Connector, Outbound, SocketEvent};

// ---------------------------------------------------------------------------
// Owned resources
// ---------------------------------------------------------------------------

/// The socket currently owned by the manager.
pub(crate) struct ActiveSocket {
    /// Events tagged with any other generation are stale.
    pub(crate) generation: u64,
    pub(crate) open: bool,
    outbound: mpsc::UnboundedSender<Outbound>,
    pump: JoinHandle<()>,
}

impl ActiveSocket {
    pub(crate) fn send(&self, text: String) {
        if self.outbound.send(Outbound::Text(text)).is_err() {
            debug!(generation = self.generation, "Transport already gone, frame dropped");
        }
    }

    fn close(self) {
        let _ = self.outbound.send(Outbound::Close);
        self.pump.abort();
    }
}

/// A scheduled task plus the token its callback must present to act.
struct Timer {
    token: u64,
    task: JoinHandle<()>,
}

pub(crate) struct Core {
    pub(crate) state: ConnectionState,
    listeners: BTreeMap<u64, Listener>,
    next_listener_id: u64,
    pub(crate) socket: Option<ActiveSocket>,
    /// Bumped by every connect and disconnect.
    pub(crate) generation: u64,
    heartbeat: Option<Timer>,
    reconnect: Option<Timer>,
    next_timer_token: u64,
    runtime: Option<Handle>,
    pub(crate) destroyed: bool,
}

impl Core {
    fn new() -> Self {
        Self {
            state: ConnectionState::default(),
            listeners: BTreeMap::new(),
            next_listener_id: 0,
            socket: None,
            generation: 0,
            heartbeat: None,
            reconnect: None,
            next_timer_token: 0,
            runtime: None,
            destroyed: false,
        }
    }

    fn next_token(&mut self) -> u64 {
        self.next_timer_token += 1;
        self.next_timer_token
    }

    /// The owned socket, if it belongs to `generation`.
    pub(crate) fn live_socket(&self, generation: u64) -> Option<&ActiveSocket> {
        self.socket.as_ref().filter(|s| s.generation == generation)
    }

    pub(crate) fn cancel_timers(&mut self) {
        if let Some(timer) = self.heartbeat.take() {
            timer.task.abort();
        }
        if let Some(timer) = self.reconnect.take() {
            timer.task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

pub(crate) struct Shared {
    pub(crate) config: ClientConfig,
    pub(crate) hooks: Hooks,
    connector: Arc<dyn Connector>,
    core: ReentrantMutex<RefCell<Core>>,
}

impl Shared {
    pub(crate) fn new(config: ClientConfig, hooks: Hooks, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            hooks,
            connector,
            core: ReentrantMutex::new(RefCell::new(Core::new())),
        }
    }

    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, RefCell<Core>> {
        self.core.lock()
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.lock().borrow().state.clone()
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.lock().borrow().destroyed
    }

    /// Apply `f` to the state, then hand the result to every subscriber.
    pub(crate) fn update(&self, f: impl FnOnce(&mut ConnectionState)) {
        let guard = self.lock();
        let (snapshot, listeners) = {
            let mut core = guard.borrow_mut();
            f(&mut core.state);
            let listeners: Vec<(u64, Listener)> = core
                .listeners
                .iter()
                .map(|(id, listener)| (*id, Arc::clone(listener)))
                .collect();
            (core.state.clone(), listeners)
        };

        for (id, listener) in listeners {
            // Earlier listeners may have unsubscribed this one or destroyed the manager.
            let registered = guard.borrow().listeners.contains_key(&id);
            if registered {
                listener(&snapshot);
            }
        }
    }

    // -- listeners ----------------------------------------------------------

    /// Register `listener` and replay the current state to it.
    ///
    /// Returns `None` after destroy: the listener still gets its replay but
    /// is not kept.
    pub(crate) fn add_listener(&self, listener: Listener) -> Option<u64> {
        let guard = self.lock();
        let (id, snapshot) = {
            let mut core = guard.borrow_mut();
            let snapshot = core.state.clone();
            if core.destroyed {
                (None, snapshot)
            } else {
                let id = core.next_listener_id;
                core.next_listener_id += 1;
                core.listeners.insert(id, Arc::clone(&listener));
                (Some(id), snapshot)
            }
        };
        listener(&snapshot);
        id
    }

    pub(crate) fn remove_listener(&self, id: u64) {
        self.lock().borrow_mut().listeners.remove(&id);
    }

    // -- lifecycle ----------------------------------------------------------

    pub(crate) fn connect(self: &Arc<Self>) {
        let guard = self.lock();
        if guard.borrow().destroyed {
            debug!("connect() on a destroyed manager ignored");
            return;
        }

        self.update(|s| {
            s.is_loading = true;
            s.error = None;
            s.phase = ConnectionPhase::Connecting;
        });

        {
            let mut core = guard.borrow_mut();
            if core.destroyed {
                return;
            }
            // The new socket supersedes the old one and everything scheduled for it.
            core.cancel_timers();
            if let Some(previous) = core.socket.take() {
                debug!(generation = previous.generation, "Closing previous socket");
                previous.close();
            }
            core.generation += 1;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                return self.fail_construction(ConnectionError::Construction(
                    "no tokio runtime available".to_string(),
                ))
            }
        };

        info!(
            url = %self.config.websocket_url,
            user_id = %self.config.user_id,
            "Connecting to Lanyard"
        );

        match self.connector.open(&self.config.websocket_url) {
            Ok(socket) => {
                let mut core = guard.borrow_mut();
                let generation = core.generation;
                let pump = runtime.spawn(pump_events(
                    Arc::downgrade(self),
                    generation,
                    socket.events,
                ));
                core.socket = Some(ActiveSocket {
                    generation,
                    open: false,
                    outbound: socket.outbound,
                    pump,
                });
                core.runtime = Some(runtime);
            }
            Err(e) => self.fail_construction(e),
        }
    }

    fn fail_construction(&self, error: ConnectionError) {
        warn!(error = %error, "Could not create socket");
        self.update(|s| {
            s.error = Some(error.clone());
            s.is_loading = false;
            s.phase = ConnectionPhase::Failed;
        });
        self.hooks.errored(&error);
    }

    pub(crate) fn reconnect(self: &Arc<Self>) {
        let guard = self.lock();
        if guard.borrow().destroyed {
            return;
        }
        self.update(|s| s.reconnect_attempts = 0);
        self.connect();
    }

    pub(crate) fn disconnect(&self) {
        let guard = self.lock();
        if guard.borrow().destroyed {
            return;
        }
        self.teardown();
    }

    /// Mark destroyed before tearing down, so a subscriber reacting to the
    /// final state cannot open another socket.
    pub(crate) fn destroy(&self) {
        let guard = self.lock();
        {
            let mut core = guard.borrow_mut();
            if core.destroyed {
                return;
            }
            core.destroyed = true;
        }
        self.teardown();

        let mut core = guard.borrow_mut();
        core.cancel_timers();
        if let Some(socket) = core.socket.take() {
            socket.close();
        }
        core.listeners.clear();
        core.runtime = None;
    }

    /// Close the socket, stop the timers and publish the idle state.
    fn teardown(&self) {
        let guard = self.lock();
        {
            let mut core = guard.borrow_mut();
            core.cancel_timers();
            if let Some(socket) = core.socket.take() {
                socket.close();
            }
            core.generation += 1;
        }

        info!("Disconnected from Lanyard");
        self.update(|s| {
            s.is_connected = false;
            s.is_loading = false;
            s.reconnect_attempts = 0;
            s.phase = ConnectionPhase::Idle;
        });
    }

    // -- timers -------------------------------------------------------------

    /// (Re)start the heartbeat at `period`, replacing any running one.
    pub(crate) fn start_heartbeat(self: &Arc<Self>, period: Duration) {
        let guard = self.lock();
        let mut core = guard.borrow_mut();
        let Some(runtime) = core.runtime.clone() else {
            return;
        };
        if let Some(previous) = core.heartbeat.take() {
            previous.task.abort();
        }

        let token = core.next_token();
        let shared = Arc::downgrade(self);
        let start = tokio::time::Instant::now() + period;
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                if !shared.heartbeat_tick(token) {
                    break;
                }
            }
        });
        core.heartbeat = Some(Timer { token, task });
        debug!(interval_ms = period.as_millis() as u64, "Heartbeat started");
    }

    /// Returns false once the heartbeat should stop.
    fn heartbeat_tick(&self, token: u64) -> bool {
        let guard = self.lock();
        let mut core = guard.borrow_mut();
        if core.heartbeat.as_ref().map(|t| t.token) != Some(token) {
            return false;
        }

        match core.socket.as_ref().filter(|s| s.open) {
            Some(socket) => {
                if let Ok(json) = Envelope::heartbeat().to_json() {
                    socket.send(json);
                }
                debug!("Heartbeat sent");
                true
            }
            None => {
                debug!("Heartbeat fired without an open socket, clearing timers");
                core.cancel_timers();
                false
            }
        }
    }

    /// Decide what happens after a close: back off and retry, or give up.
    pub(crate) fn schedule_reconnect(self: &Arc<Self>) {
        let guard = self.lock();
        let (attempts, generation) = {
            let core = guard.borrow();
            (core.state.reconnect_attempts, core.generation)
        };
        let max_attempts = self.config.max_reconnect_attempts;

        if self.config.auto_reconnect && attempts < max_attempts {
            let attempt = attempts + 1;
            self.update(|s| {
                s.reconnect_attempts = attempt;
                s.phase = ConnectionPhase::Reconnecting;
            });

            let mut core = guard.borrow_mut();
            // A subscriber may have disconnected us while being notified.
            if core.generation != generation || core.destroyed {
                return;
            }
            let Some(runtime) = core.runtime.clone() else {
                return;
            };

            let delay = reconnect_delay(attempt);
            info!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting to Lanyard"
            );

            let token = core.next_token();
            let shared = Arc::downgrade(self);
            let deadline = tokio::time::Instant::now() + delay;
            let task = runtime.spawn(async move {
                tokio::time::sleep_until(deadline).await;
                if let Some(shared) = shared.upgrade() {
                    shared.fire_reconnect(token);
                }
            });
            if let Some(previous) = core.reconnect.replace(Timer { token, task }) {
                previous.task.abort();
            }
        } else if attempts >= max_attempts {
            warn!(attempts, "Giving up on Lanyard after maximum reconnect attempts");
            let error = ConnectionError::MaxReconnectAttempts;
            self.update(|s| {
                s.error = Some(error.clone());
                s.is_loading = false;
                s.phase = ConnectionPhase::Failed;
            });
            self.hooks.errored(&error);
        }
    }

    fn fire_reconnect(self: &Arc<Self>, token: u64) {
        let guard = self.lock();
        {
            let mut core = guard.borrow_mut();
            if core.reconnect.as_ref().map(|t| t.token) != Some(token) {
                return;
            }
            core.reconnect = None;
        }
        self.connect();
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let core = self.core.get_mut().get_mut();
        core.cancel_timers();
        if let Some(socket) = core.socket.take() {
            socket.close();
        }
    }
}

/// Forward one socket's events into the manager until the socket goes away.
async fn pump_events(
    shared: Weak<Shared>,
    generation: u64,
    mut events: mpsc::UnboundedReceiver<SocketEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.handle_socket_event(generation, event);
    }
}
