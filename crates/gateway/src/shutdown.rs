use std::sync::{Arc, Mutex, PoisonError};

use {tokio_util::sync::CancellationToken, tracing::info};

/// Process-restart request, decoupled from actually exiting.
///
/// The binary waits on [`wait`](Self::wait) and exits; tests just observe
/// [`is_requested`](Self::is_requested).
#[derive(Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    reason: Arc<Mutex<Option<String>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the process to stop. The first reason given is kept.
    pub fn request(&self, reason: impl Into<String>) {
        let reason = reason.into();
        {
            let mut slot = self.reason.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                info!(reason = %reason, "shutdown requested");
                *slot = Some(reason);
            }
        }
        self.token.cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<String> {
        self.reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolves once shutdown has been requested.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::time::Duration};

    #[tokio::test]
    async fn request_wakes_waiters_and_keeps_first_reason() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_requested());

        let waiter = {
            let s = shutdown.clone();
            tokio::spawn(async move { s.wait().await })
        };

        shutdown.request("manual disconnect");
        shutdown.request("second");
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();

        assert!(shutdown.is_requested());
        assert_eq!(shutdown.reason().as_deref(), Some("manual disconnect"));
    }
}
