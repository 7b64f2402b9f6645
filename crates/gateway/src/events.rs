use std::sync::Arc;

use {
    pesan_channels::{EventReceiver, InboundMessage, TransportEvent},
    tracing::{debug, info, warn},
};

use crate::state::GatewayState;

/// Apply transport events to the session in arrival order until the
/// transport drops its sender.
pub async fn run_event_pump(state: Arc<GatewayState>, mut events: EventReceiver) {
    while let Some(event) = events.recv().await {
        match &event {
            TransportEvent::MessageReceived(msg) => maybe_reply_status(&state, msg),
            _ => {
                state.session.handle_transport_event(&event);
            },
        }
    }
    debug!("transport event stream ended");
}

/// Whole-body, case-insensitive match. An empty keyword disables the reply.
fn is_status_keyword(body: &str, keyword: &str) -> bool {
    !keyword.is_empty() && body.to_lowercase() == keyword.to_lowercase()
}

/// Answer the status keyword through the dispatch queue. The outcome is
/// awaited off the pump so event handling never waits on a send.
fn maybe_reply_status(state: &GatewayState, msg: &InboundMessage) {
    let cfg = &state.config.whatsapp;
    if !is_status_keyword(&msg.body, &cfg.status_keyword) {
        return;
    }
    info!(from = %msg.from, "status keyword received");
    let handle = state.queue.enqueue(msg.from.clone(), cfg.status_reply.clone());
    tokio::spawn(async move {
        if let Err(e) = handle.await {
            warn!(error = %e, "status reply failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        async_trait::async_trait,
        pesan_channels::{
            DeliveryReceipt, MessagingTransport, SessionArtifacts, TransportError, event_channel,
        },
        pesan_config::PesanConfig,
        pesan_sessions::SessionState,
        std::{io, sync::Mutex, time::Duration},
    };

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl MessagingTransport for Recorder {
        async fn send_text(
            &self,
            destination: &str,
            body: &str,
        ) -> Result<DeliveryReceipt, TransportError> {
            self.sent
                .lock()
                .unwrap()
                .push((destination.to_string(), body.to_string()));
            Ok(DeliveryReceipt::new(destination, None))
        }

        async fn logout(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    struct NoArtifacts;

    #[async_trait]
    impl SessionArtifacts for NoArtifacts {
        async fn cleanup(&self) -> io::Result<()> {
            Ok(())
        }
    }

    fn state(recorder: &Arc<Recorder>) -> Arc<GatewayState> {
        state_with(recorder, |_| {})
    }

    fn state_with(
        recorder: &Arc<Recorder>,
        configure: impl FnOnce(&mut PesanConfig),
    ) -> Arc<GatewayState> {
        let mut config = PesanConfig::default();
        config.dispatch.min_delay_ms = 0;
        config.dispatch.max_delay_ms = 0;
        configure(&mut config);
        GatewayState::new(
            config,
            Arc::clone(recorder) as Arc<dyn MessagingTransport>,
            Arc::new(NoArtifacts),
        )
    }

    #[tokio::test]
    async fn pump_applies_events_in_order() {
        let recorder = Arc::new(Recorder::default());
        let state = state(&recorder);
        let (tx, rx) = event_channel();

        tx.send(TransportEvent::PairingCodeIssued { code: "c".into() })
            .unwrap();
        tx.send(TransportEvent::Authenticated).unwrap();
        tx.send(TransportEvent::Ready).unwrap();
        drop(tx);

        run_event_pump(Arc::clone(&state), rx).await;

        let status = state.session.current_status();
        assert_eq!(status.state, SessionState::Ready);
        assert!(status.pairing.get().is_none());
    }

    #[tokio::test]
    async fn status_keyword_gets_a_reply() {
        let recorder = Arc::new(Recorder::default());
        let state = state(&recorder);
        let (tx, rx) = event_channel();

        for body in ["P", " p ", "hello"] {
            tx.send(TransportEvent::MessageReceived(InboundMessage {
                from: "62811@c.us".into(),
                body: body.into(),
            }))
            .unwrap();
        }
        drop(tx);
        run_event_pump(Arc::clone(&state), rx).await;

        tokio::time::timeout(Duration::from_secs(1), async {
            while recorder.sent.lock().unwrap().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(*recorder.sent.lock().unwrap(), vec![(
            "62811@c.us".to_string(),
            "Status Active".to_string()
        )]);
        assert_eq!(state.session.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn keyword_matches_whole_body_ignoring_case() {
        assert!(is_status_keyword("p", "p"));
        assert!(is_status_keyword("P", "p"));
        assert!(is_status_keyword("status", "STATUS"));
        assert!(!is_status_keyword(" p", "p"));
        assert!(!is_status_keyword("p\n", "p"));
        assert!(!is_status_keyword("ping", "p"));
    }

    #[tokio::test]
    async fn empty_keyword_disables_auto_reply() {
        let recorder = Arc::new(Recorder::default());
        let state = state_with(&recorder, |c| c.whatsapp.status_keyword = String::new());
        let (tx, rx) = event_channel();

        tx.send(TransportEvent::MessageReceived(InboundMessage {
            from: "62811@c.us".into(),
            body: String::new(),
        }))
        .unwrap();
        drop(tx);
        run_event_pump(Arc::clone(&state), rx).await;

        assert_eq!(state.queue.workers_started(), 0);
        assert!(recorder.sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_event_does_not_interrupt_queued_send() {
        let recorder = Arc::new(Recorder::default());
        let state = state_with(&recorder, |c| {
            c.dispatch.min_delay_ms = 5_000;
            c.dispatch.max_delay_ms = 5_000;
        });
        state
            .session
            .handle_transport_event(&TransportEvent::Ready);

        let handle = state.queue.enqueue("62811@c.us", "hello");

        // Worker is now inside its pre-send pause.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(state.queue.is_worker_active());
        assert!(recorder.sent.lock().unwrap().is_empty());

        let (tx, rx) = event_channel();
        tx.send(TransportEvent::Disconnected {
            reason: Some("phone offline".into()),
        })
        .unwrap();
        drop(tx);
        run_event_pump(Arc::clone(&state), rx).await;
        assert_eq!(state.session.state(), SessionState::Disconnected);

        let receipt = handle.await.unwrap();
        assert_eq!(receipt.destination, "62811@c.us");
        assert_eq!(*recorder.sent.lock().unwrap(), vec![(
            "62811@c.us".to_string(),
            "hello".to_string()
        )]);
        assert_eq!(state.session.state(), SessionState::Disconnected);
    }
}
