use std::{sync::Arc, time::Instant};

use {
    pesan_channels::{DeliveryReceipt, MessagingTransport, SessionArtifacts},
    pesan_config::PesanConfig,
    pesan_dispatch::{DelayRange, DispatchQueue},
    pesan_sessions::SessionController,
    tracing::{info, warn},
};

use crate::{
    access::{AccessPolicy, SendRequest},
    error::SendError,
    shutdown::Shutdown,
};

/// Process-wide gateway state, shared across handlers and the event pump.
pub struct GatewayState {
    /// Server version string.
    pub version: String,
    pub config: PesanConfig,
    pub session: SessionController,
    pub queue: DispatchQueue,
    pub access: AccessPolicy,
    pub shutdown: Shutdown,
    transport: Arc<dyn MessagingTransport>,
    artifacts: Arc<dyn SessionArtifacts>,
    started_at: Instant,
}

impl GatewayState {
    pub fn new(
        config: PesanConfig,
        transport: Arc<dyn MessagingTransport>,
        artifacts: Arc<dyn SessionArtifacts>,
    ) -> Arc<Self> {
        let delay = DelayRange::from_millis(config.dispatch.min_delay_ms, config.dispatch.max_delay_ms);
        Arc::new(Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            access: AccessPolicy::from(&config.access),
            session: SessionController::new(),
            queue: DispatchQueue::new(Arc::clone(&transport), delay),
            shutdown: Shutdown::new(),
            transport,
            artifacts,
            config,
            started_at: Instant::now(),
        })
    }

    /// Chat id for a phone number: `<number>@<domain_suffix>`.
    pub fn destination_for(&self, phone_number: &str) -> String {
        format!("{phone_number}@{}", self.config.whatsapp.domain_suffix)
    }

    /// Gate, enqueue and wait for the delivery outcome.
    pub async fn send_message(&self, request: &SendRequest) -> Result<DeliveryReceipt, SendError> {
        self.access.authorize(&request.phone_number)?;
        let destination = self.destination_for(&request.phone_number);
        let receipt = self
            .queue
            .enqueue(destination, request.message.clone())
            .await?;
        Ok(receipt)
    }

    /// Tear the session down and request a restart.
    ///
    /// Logout and cleanup are best-effort; the shutdown request always happens.
    pub async fn disconnect(&self) {
        info!("manual disconnect requested");
        if let Err(e) = self.transport.logout().await {
            warn!(error = %e, "transport logout failed");
        }
        if let Err(e) = self.artifacts.cleanup().await {
            warn!(error = %e, "session cleanup failed");
        }
        self.shutdown.request("manual disconnect");
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
