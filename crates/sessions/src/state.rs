use std::fmt;

use serde::Serialize;

/// Connection state of the linked-device session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    PendingPairing,
    Authenticated,
    Ready,
    AuthFailed,
    Disconnected,
}

impl SessionState {
    pub const ALL: [SessionState; 6] = [
        SessionState::Unauthenticated,
        SessionState::PendingPairing,
        SessionState::Authenticated,
        SessionState::Ready,
        SessionState::AuthFailed,
        SessionState::Disconnected,
    ];

    /// True while the linked device holds valid credentials.
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated | Self::Ready)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "Unauthenticated",
            Self::PendingPairing => "PendingPairing",
            Self::Authenticated => "Authenticated",
            Self::Ready => "Ready",
            Self::AuthFailed => "AuthFailed",
            Self::Disconnected => "Disconnected",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
