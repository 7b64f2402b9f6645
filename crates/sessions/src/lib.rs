//! Linked-device session lifecycle.
//!
//! [`SessionController`] folds transport lifecycle events into a
//! [`SessionState`] and keeps the rendered pairing code only while the
//! session is waiting to be paired.

pub mod controller;
pub mod pairing;
pub mod state;

pub use {
    controller::{SessionController, SessionStatus},
    pairing::{PairingArtifact, PairingCodeCache, PairingRenderError},
    state::SessionState,
};
