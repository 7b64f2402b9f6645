use std::{
    collections::VecDeque,
    pin::Pin,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    task::{Context, Poll},
};

use {
    pesan_channels::{DeliveryReceipt, MessagingTransport},
    tokio::{sync::oneshot, time::Instant},
    tracing::{debug, info, warn},
};

use crate::{delay::DelayRange, error::DispatchError};

/// Result delivered through an [`OutcomeHandle`].
pub type Outcome = Result<DeliveryReceipt, DispatchError>;

struct QueuedMessage {
    id: u64,
    destination: String,
    body: String,
    enqueued_at: Instant,
    outcome: oneshot::Sender<Outcome>,
}

#[derive(Default)]
struct QueueState {
    items: VecDeque<QueuedMessage>,
    worker_active: bool,
}

struct Inner {
    transport: Arc<dyn MessagingTransport>,
    delay: DelayRange,
    /// Guarded by a std mutex: never held across an await.
    state: Mutex<QueueState>,
    next_id: AtomicU64,
    workers_started: AtomicU64,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pop the head item, or mark the worker inactive when the queue is empty.
    /// Both happen under the lock `enqueue` takes, so an item pushed after the
    /// worker saw an empty queue always starts a new worker.
    fn next_item(&self) -> Option<QueuedMessage> {
        let mut state = self.lock();
        let item = state.items.pop_front();
        if item.is_none() {
            state.worker_active = false;
        }
        item
    }
}

/// FIFO, single-worker outbound queue.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct DispatchQueue {
    inner: Arc<Inner>,
}

impl DispatchQueue {
    pub fn new(transport: Arc<dyn MessagingTransport>, delay: DelayRange) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                delay,
                state: Mutex::new(QueueState::default()),
                next_id: AtomicU64::new(1),
                workers_started: AtomicU64::new(0),
            }),
        }
    }

    /// Append a message and start the worker if none is running.
    ///
    /// Never blocks. Must be called from within a tokio runtime.
    pub fn enqueue(&self, destination: impl Into<String>, body: impl Into<String>) -> OutcomeHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let item = QueuedMessage {
            id,
            destination: destination.into(),
            body: body.into(),
            enqueued_at: Instant::now(),
            outcome: tx,
        };

        let (start_worker, depth) = {
            let mut state = self.inner.lock();
            state.items.push_back(item);
            let start = !state.worker_active;
            state.worker_active = true;
            (start, state.items.len())
        };
        debug!(id, depth, "message enqueued");

        if start_worker {
            let n = self.inner.workers_started.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(worker = n, "starting dispatch worker");
            tokio::spawn(run_worker(Arc::clone(&self.inner)));
        }

        OutcomeHandle { id, rx }
    }

    /// Messages waiting, excluding the one being processed.
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_worker_active(&self) -> bool {
        self.inner.lock().worker_active
    }

    /// Number of workers started over the queue's lifetime.
    pub fn workers_started(&self) -> u64 {
        self.inner.workers_started.load(Ordering::Relaxed)
    }

    pub fn delay_range(&self) -> DelayRange {
        self.inner.delay
    }
}

async fn run_worker(inner: Arc<Inner>) {
    while let Some(item) = inner.next_item() {
        let pause = inner.delay.sample();
        debug!(id = item.id, pause_ms = pause.as_millis() as u64, "waiting before send");
        tokio::time::sleep(pause).await;

        let QueuedMessage {
            id,
            destination,
            body,
            enqueued_at,
            outcome,
        } = item;

        // The send runs in its own task so a panicking transport resolves the
        // handle instead of killing the worker. Only unwinding builds get here:
        // the release profile sets `panic = "abort"`, so a transport panic
        // there ends the process.
        let transport = Arc::clone(&inner.transport);
        let dest = destination.clone();
        let result = match tokio::spawn(async move { transport.send_text(&dest, &body).await }).await
        {
            Ok(Ok(receipt)) => {
                info!(
                    id,
                    destination = %destination,
                    waited_ms = enqueued_at.elapsed().as_millis() as u64,
                    "message sent"
                );
                Ok(receipt)
            },
            Ok(Err(e)) => {
                warn!(id, destination = %destination, error = %e, "message delivery failed");
                Err(DispatchError::Transport(e))
            },
            Err(e) => {
                warn!(id, destination = %destination, error = %e, "transport task failed");
                Err(DispatchError::Panicked)
            },
        };

        if outcome.send(result).is_err() {
            debug!(id, "caller dropped its outcome handle");
        }
    }
    debug!("dispatch queue drained, worker exiting");
}

/// Resolves once with the delivery outcome of one queued message.
///
/// Dropping the handle does not withdraw the message.
#[derive(Debug)]
pub struct OutcomeHandle {
    id: u64,
    rx: oneshot::Receiver<Outcome>,
}

impl OutcomeHandle {
    /// Queue-assigned id, increasing in enqueue order.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Future for OutcomeHandle {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|r| r.unwrap_or(Err(DispatchError::Dropped)))
    }
}
