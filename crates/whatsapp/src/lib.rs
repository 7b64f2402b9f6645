//! WhatsApp transport backed by a bridge sidecar.
//!
//! The bridge is any program that speaks newline-delimited JSON on
//! stdin/stdout:
//!
//! - requests: `{"id":1,"method":"sendMessage","params":{"to":"...","body":"..."}}`
//!   and `{"id":2,"method":"logout"}`
//! - responses: `{"id":1,"result":{"id":"<message id>"}}` or
//!   `{"id":1,"error":{"message":"..."}}`
//! - events: `{"event":"qr","code":"..."}`, `{"event":"authenticated"}`,
//!   `{"event":"ready"}`, `{"event":"auth_failure","message":"..."}`,
//!   `{"event":"disconnected","reason":"..."}`,
//!   `{"event":"message","from":"...","body":"..."}`
//!
//! The bridge's stderr is forwarded to the log. The default bridge lives in
//! `bridge/` at the repository root (`npm install` there first).

pub mod bridge;
pub mod frames;
pub mod store;

pub use {bridge::BridgeTransport, store::AuthStateDir};
