//! Serialized outbound delivery.
//!
//! [`DispatchQueue`] accepts `(destination, body)` pairs, sends them one at a
//! time in FIFO order with a randomized pause before each send, and hands
//! every caller an [`OutcomeHandle`] that resolves exactly once.

pub mod delay;
pub mod error;
pub mod queue;

pub use {
    delay::DelayRange,
    error::DispatchError,
    queue::{DispatchQueue, Outcome, OutcomeHandle},
};
