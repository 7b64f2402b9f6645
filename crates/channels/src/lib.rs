//! Messaging transport seam.
//!
//! A transport delivers outbound text and reports connection lifecycle
//! events (pairing code issued, authenticated, ready, auth failure,
//! disconnect) plus inbound messages over an [`EventSender`].

pub mod transport;

pub use transport::{
    DeliveryReceipt, EventReceiver, EventSender, InboundMessage, MessagingTransport,
    SessionArtifacts, TransportError, TransportEvent, event_channel,
};
