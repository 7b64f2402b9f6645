use std::{
    io,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tokio::sync::mpsc,
};

/// Lifecycle and inbound events raised by a transport, in the order it observes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A fresh pairing code is available for device linking.
    PairingCodeIssued { code: String },
    Authenticated,
    Ready,
    AuthFailed { reason: Option<String> },
    Disconnected { reason: Option<String> },
    MessageReceived(InboundMessage),
}

impl TransportEvent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PairingCodeIssued { .. } => "pairing-code-issued",
            Self::Authenticated => "authenticated",
            Self::Ready => "ready",
            Self::AuthFailed { .. } => "auth-failed",
            Self::Disconnected { .. } => "disconnected",
            Self::MessageReceived(_) => "message",
        }
    }
}

/// A message received by the linked account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Chat id of the sender, usable as a destination for replies.
    pub from: String,
    pub body: String,
}

/// Confirmation returned by a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub destination: String,
    /// Transport-assigned message id, when the transport reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub sent_at_ms: u64,
}

impl DeliveryReceipt {
    pub fn new(destination: impl Into<String>, message_id: Option<String>) -> Self {
        Self {
            destination: destination.into(),
            message_id,
            sent_at_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport is not connected")]
    NotConnected,
    #[error("send rejected: {0}")]
    Rejected(String),
    #[error("transport request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport protocol error: {0}")]
    Protocol(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Outbound half of a messaging transport.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Deliver `body` to the opaque chat id `destination`.
    async fn send_text(&self, destination: &str, body: &str)
    -> Result<DeliveryReceipt, TransportError>;

    /// Log the linked device out and tear the connection down.
    async fn logout(&self) -> Result<(), TransportError>;
}

/// Persisted credentials/session files owned by a transport.
#[async_trait]
pub trait SessionArtifacts: Send + Sync {
    /// Remove persisted session state. Idempotent: succeeds when nothing is left.
    async fn cleanup(&self) -> io::Result<()>;
}

pub type EventSender = mpsc::UnboundedSender<TransportEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// Channel a transport raises its events on.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
