//! Gateway: HTTP facade over the messaging session.
//!
//! Lifecycle:
//! 1. Spawn the bridge transport and pump its events into the session controller
//! 2. Bind the HTTP server (status page, pairing page, send, disconnect, health)
//! 3. Serve until a disconnect requests a restart, then drain and return
//!
//! Sends never hit the transport directly: every message goes through the
//! dispatch queue so deliveries stay paced and strictly ordered.

pub mod access;
pub mod error;
pub mod events;
pub mod pages;
pub mod server;
pub mod shutdown;
pub mod state;

pub use {
    error::SendError,
    server::{build_gateway_app, start_gateway},
    shutdown::Shutdown,
    state::GatewayState,
};
