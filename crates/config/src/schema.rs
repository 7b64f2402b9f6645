//! Config schema types (server, access, dispatch, whatsapp).

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PesanConfig {
    pub server: ServerConfig,
    pub access: AccessConfig,
    pub dispatch: DispatchConfig,
    pub whatsapp: WhatsAppConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Public URL shown in the usage example on the status page.
    pub base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 3000,
            base_url: None,
        }
    }
}

impl ServerConfig {
    /// Configured base URL, or `http://localhost:<port>`.
    pub fn public_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }
}

/// Restricted-mode gate for outbound messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// When true, only `allowed_numbers` may be messaged.
    pub restricted: bool,
    pub allowed_numbers: Vec<String>,
}

/// Throttle applied before every outbound send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1_000,
            max_delay_ms: 10_000,
        }
    }
}

/// WhatsApp bridge sidecar settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    /// Program that runs the bridge sidecar.
    pub bridge_command: String,
    pub bridge_args: Vec<String>,
    /// Directory where the bridge persists its linked-device credentials.
    pub session_dir: String,
    /// Suffix appended to phone numbers to form a chat id (`<number>@<suffix>`).
    pub domain_suffix: String,
    pub request_timeout_secs: u64,
    /// Inbound message body that triggers the status auto-reply.
    pub status_keyword: String,
    pub status_reply: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            bridge_command: "node".into(),
            bridge_args: vec!["bridge/whatsapp-bridge.js".into()],
            session_dir: ".wwebjs_auth".into(),
            domain_suffix: "c.us".into(),
            request_timeout_secs: 60,
            status_keyword: "p".into(),
            status_reply: "Status Active".into(),
        }
    }
}
