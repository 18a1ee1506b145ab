//! Lanyard connection manager.
//!
//! Owns a single socket to the relay for one user, answers its Hello with
//! a subscription and a heartbeat, reconnects with capped exponential
//! backoff when the socket closes, and publishes every state change to
//! subscribers.

mod client;
mod connection;
mod handler;
mod types;


pub use client::{ConnectionManager, Subscription};
pub use types::Hooks;
