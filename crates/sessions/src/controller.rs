use {
    pesan_channels::TransportEvent,
    serde::Serialize,
    tokio::sync::watch,
    tracing::{debug, info, warn},
};

use crate::{
    pairing::{PairingArtifact, PairingCodeCache},
    state::SessionState,
};

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub authenticated: bool,
    pub pairing: PairingCodeCache,
    /// Reason attached to the last auth failure or disconnect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Owns the session state machine. The only mutator is
/// [`handle_transport_event`](Self::handle_transport_event).
pub struct SessionController {
    status: watch::Sender<SessionStatus>,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        let (status, _) = watch::channel(SessionStatus::default());
        Self { status }
    }

    /// Side-effect-free snapshot of the current status.
    pub fn current_status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.status.borrow().state
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Apply one transport event. Never suspends; every lifecycle event is
    /// accepted in every state. Returns the new state, or `None` for events
    /// that carry no lifecycle meaning.
    pub fn handle_transport_event(&self, event: &TransportEvent) -> Option<SessionState> {
        let (next, artifact, reason) = match event {
            TransportEvent::PairingCodeIssued { code } => (
                SessionState::PendingPairing,
                Some(PairingArtifact::render(code)),
                None,
            ),
            TransportEvent::Authenticated => (SessionState::Authenticated, None, None),
            TransportEvent::Ready => (SessionState::Ready, None, None),
            TransportEvent::AuthFailed { reason } => (SessionState::AuthFailed, None, reason.clone()),
            TransportEvent::Disconnected { reason } => {
                (SessionState::Disconnected, None, reason.clone())
            },
            TransportEvent::MessageReceived(_) => {
                debug!("ignoring non-lifecycle transport event");
                return None;
            },
        };

        let mut previous = next;
        self.status.send_modify(|status| {
            previous = status.state;
            status.state = next;
            status.authenticated = next.is_authenticated();
            status.reason = reason.clone();
            match artifact {
                Some(a) => status.pairing.set(a),
                None => status.pairing.clear(),
            }
        });

        match next {
            SessionState::PendingPairing => info!(from = %previous, "pairing code issued"),
            SessionState::AuthFailed | SessionState::Disconnected => warn!(
                from = %previous,
                to = %next,
                reason = reason.as_deref().unwrap_or("unknown"),
                "session lost"
            ),
            _ => info!(from = %previous, to = %next, "session state changed"),
        }
        Some(next)
    }
}
