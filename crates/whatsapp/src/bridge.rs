//! Stdio transport: spawn the bridge sidecar and exchange JSON lines over stdin/stdout.

use std::{
    collections::HashMap,
    process::Stdio,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    pesan_channels::{
        DeliveryReceipt, EventSender, MessagingTransport, TransportError, TransportEvent,
    },
    pesan_config::WhatsAppConfig,
    serde_json::{Value, json},
    tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
        process::{Child, ChildStdin, Command},
        sync::{Mutex, oneshot},
        task::JoinHandle,
    },
    tracing::{debug, info, trace, warn},
};

use crate::frames::{BridgeFrame, BridgeRequest, BridgeResponse};

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<BridgeResponse>>>>;

/// [`MessagingTransport`] backed by a bridge sidecar process.
pub struct BridgeTransport {
    child: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    pending: PendingMap,
    /// Set once the bridge's stdout closes.
    closed: Arc<AtomicBool>,
    next_id: AtomicU64,
    timeout: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl BridgeTransport {
    /// Spawn the bridge configured in `config`; lifecycle events go to `events`.
    pub async fn from_config(
        config: &WhatsAppConfig,
        events: EventSender,
    ) -> Result<Arc<Self>, TransportError> {
        Self::spawn(
            &config.bridge_command,
            &config.bridge_args,
            &HashMap::from([("PESAN_SESSION_DIR".to_string(), config.session_dir.clone())]),
            Duration::from_secs(config.request_timeout_secs),
            events,
        )
        .await
    }

    /// Spawn `command` and start the stdout/stderr reader tasks.
    pub async fn spawn(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        timeout: Duration,
        events: EventSender,
    ) -> Result<Arc<Self>, TransportError> {
        let mut child = Command::new(command)
            .args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(TransportError::Protocol(
                "failed to capture bridge stdio".into(),
            ));
        };
        info!(command, pid = child.id().unwrap_or_default(), "whatsapp bridge started");

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let closed = Arc::new(AtomicBool::new(false));

        let reader_pending = Arc::clone(&pending);
        let reader_closed = Arc::clone(&closed);
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        trace!(raw = %line, "bridge -> gateway");
                        route_frame(line, &reader_pending, &events).await;
                    },
                    Ok(None) => {
                        debug!("bridge stdout closed");
                        break;
                    },
                    Err(e) => {
                        warn!(error = %e, "error reading from bridge stdout");
                        break;
                    },
                }
            }
            // Fail in-flight requests and report the session as gone.
            reader_closed.store(true, Ordering::SeqCst);
            reader_pending.lock().await.clear();
            let _ = events.send(TransportEvent::Disconnected {
                reason: Some("bridge exited".into()),
            });
        });

        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "pesan_whatsapp::bridge_stderr", "{line}");
            }
        });

        Ok(Arc::new(Self {
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            pending,
            closed,
            next_id: AtomicU64::new(1),
            timeout,
            tasks: Mutex::new(vec![reader, stderr_task]),
        }))
    }

    /// Send a request and wait for the matching response.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut payload = serde_json::to_string(&BridgeRequest { id, method, params })
            .map_err(|e| TransportError::Protocol(e.to_string()))?;
        payload.push('\n');

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if self.closed.load(Ordering::SeqCst) {
                return Err(TransportError::NotConnected);
            }
            pending.insert(id, tx);
        }

        trace!(method, id, "gateway -> bridge");
        let written = {
            let mut stdin = self.stdin.lock().await;
            match stdin.write_all(payload.as_bytes()).await {
                Ok(()) => stdin.flush().await,
                Err(e) => Err(e),
            }
        };
        if let Err(e) = written {
            self.pending.lock().await.remove(&id);
            return Err(e.into());
        }

        let resp = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(_)) => return Err(TransportError::NotConnected),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(TransportError::Timeout(self.timeout));
            },
        };

        if let Some(err) = resp.error {
            return Err(TransportError::Rejected(err.message));
        }
        Ok(resp.result.unwrap_or(Value::Null))
    }

    /// Check if the bridge process is still running.
    pub async fn is_alive(&self) -> bool {
        let mut child = self.child.lock().await;
        matches!(child.try_wait(), Ok(None))
    }

    /// Kill the bridge process and stop the reader tasks.
    pub async fn kill(&self) {
        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }
        let mut child = self.child.lock().await;
        if let Err(e) = child.kill().await {
            debug!(error = %e, "bridge already exited");
        }
    }
}

async fn route_frame(line: &str, pending: &PendingMap, events: &EventSender) {
    match BridgeFrame::parse(line) {
        Ok(BridgeFrame::Response(resp)) => {
            let id = resp.id;
            match pending.lock().await.remove(&id) {
                Some(tx) => {
                    let _ = tx.send(resp);
                },
                None => warn!(id, "received response for unknown request id"),
            }
        },
        Ok(BridgeFrame::Event(ev)) => {
            let event = TransportEvent::from(ev);
            debug!(event = event.kind(), "bridge event");
            if events.send(event).is_err() {
                debug!("event receiver dropped");
            }
        },
        Err(e) => warn!(error = %e, "ignoring unrecognised bridge frame"),
    }
}

#[async_trait]
impl MessagingTransport for BridgeTransport {
    async fn send_text(
        &self,
        destination: &str,
        body: &str,
    ) -> Result<DeliveryReceipt, TransportError> {
        let result = self
            .request(
                "sendMessage",
                Some(json!({ "to": destination, "body": body })),
            )
            .await?;
        let message_id = result
            .get("id")
            .and_then(Value::as_str)
            .map(String::from);
        Ok(DeliveryReceipt::new(destination, message_id))
    }

    async fn logout(&self) -> Result<(), TransportError> {
        let result = self.request("logout", None).await.map(|_| ());
        self.kill().await;
        result
    }
}
