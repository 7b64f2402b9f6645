use std::collections::HashSet;

use pesan_config::AccessConfig;

use crate::error::SendError;

// ── Types ────────────────────────────────────────────────────────────────────

/// Validated `/send-message` input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub phone_number: String,
    pub message: String,
}

/// Restricted-mode allow-list gate.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    restricted: bool,
    allowed: HashSet<String>,
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Canonical form used for allow-list comparison: trimmed, no leading `+`.
pub fn normalize_number(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_prefix('+').unwrap_or(trimmed)
}

// ── Gate logic ───────────────────────────────────────────────────────────────

impl SendRequest {
    /// Reject missing inputs before anything is queued.
    pub fn parse(phone_number: Option<&str>, message: Option<&str>) -> Result<Self, SendError> {
        let phone = phone_number.map(normalize_number).unwrap_or_default();
        let message = message.unwrap_or_default();
        if phone.is_empty() || message.is_empty() {
            return Err(SendError::MissingFields);
        }
        Ok(Self {
            phone_number: phone.to_string(),
            message: message.to_string(),
        })
    }
}

impl From<&AccessConfig> for AccessPolicy {
    fn from(config: &AccessConfig) -> Self {
        Self {
            restricted: config.restricted,
            allowed: config
                .allowed_numbers
                .iter()
                .map(|n| normalize_number(n))
                .filter(|n| !n.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

impl AccessPolicy {
    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Allow everything unless restricted; in restricted mode only allow-listed numbers.
    pub fn authorize(&self, phone_number: &str) -> Result<(), SendError> {
        if !self.restricted || self.allowed.contains(normalize_number(phone_number)) {
            return Ok(());
        }
        Err(SendError::NotAllowed(phone_number.to_string()))
    }
}
