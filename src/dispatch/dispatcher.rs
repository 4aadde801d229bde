//! Bounded work queues drained by worker tasks.
//!
//! Each worker owns one queue. Work is routed to a queue by the provider it
//! came from, so units from one server are performed in the order they were
//! enqueued while different servers proceed in parallel.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::{Coordinator, DispatchError, EventListener, ListenerId, ListenerRegistry, Work};
use crate::config::DispatchConfig;
use crate::events::{is_interesting_and_usable, GerritEvent, Provider};

/// Owns the work queues, their workers and the listener set.
pub struct EventDispatcher {
    listeners: Arc<ListenerRegistry>,
    sender: DispatchSender,
    workers: JoinSet<()>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners)
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl EventDispatcher {
    /// Start the dispatcher's workers. Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(config: &DispatchConfig) -> Self {
        let capacity = config.queue_capacity.max(1);
        let worker_count = config.workers.max(1);
        let listeners = Arc::new(ListenerRegistry::new());
        let cancel = CancellationToken::new();

        let mut senders = Vec::with_capacity(worker_count);
        let mut workers = JoinSet::new();
        for index in 0..worker_count {
            let (tx, rx) = mpsc::channel(capacity);
            senders.push(tx);
            workers.spawn(run_worker(
                index,
                rx,
                Arc::clone(&listeners),
                cancel.clone(),
            ));
        }

        tracing::debug!(workers = worker_count, capacity, "Dispatcher started");

        Self {
            listeners,
            sender: DispatchSender {
                queues: senders.into(),
                cancel: cancel.clone(),
            },
            workers,
            cancel,
        }
    }

    /// Get a producer handle. Handles are cheap to clone.
    #[must_use]
    pub fn sender(&self) -> DispatchSender {
        self.sender.clone()
    }

    /// Register a listener for every subsequently delivered event.
    pub fn add_listener(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Deregister a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Enqueue work through the dispatcher's own handle.
    ///
    /// # Errors
    ///
    /// See [`DispatchSender::enqueue`].
    pub async fn enqueue(&self, work: Work) -> Result<(), DispatchError> {
        self.sender.enqueue(work).await
    }

    /// Stop accepting work, perform everything already queued, and wait for
    /// the workers to finish.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Worker` if a worker task failed.
    pub async fn shutdown(mut self) -> Result<(), DispatchError> {
        tracing::debug!("Dispatcher shutting down");
        self.cancel.cancel();

        let mut result = Ok(());
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Dispatch worker failed");
                result = Err(DispatchError::Worker(e));
            }
        }
        result
    }
}

#[async_trait]
impl Coordinator for EventDispatcher {
    async fn notify_listeners(&self, event: GerritEvent) {
        self.listeners.notify_listeners(event).await;
    }
}

/// Producer handle onto the dispatcher's queues.
#[derive(Debug, Clone)]
pub struct DispatchSender {
    queues: Arc<[mpsc::Sender<Work>]>,
    cancel: CancellationToken,
}

impl DispatchSender {
    /// Enqueue a unit, waiting while its queue is full.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Closed` once the dispatcher has shut down.
    pub async fn enqueue(&self, work: Work) -> Result<(), DispatchError> {
        if self.cancel.is_cancelled() {
            return Err(DispatchError::Closed);
        }

        let index = queue_index(work.provider(), self.queues.len());
        let queue = &self.queues[index];
        if queue.capacity() == 0 {
            tracing::debug!(queue = index, "Queue full, waiting");
        }

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(DispatchError::Closed),
            sent = queue.send(work) => sent.map_err(|_| DispatchError::Closed),
        }
    }

    /// Enqueue a parsed payload, skipping it if it is not an interesting,
    /// usable event. Returns whether a unit was enqueued.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::Closed` once the dispatcher has shut down.
    pub async fn enqueue_json(
        &self,
        json: Map<String, Value>,
        provider: Option<Provider>,
    ) -> Result<bool, DispatchError> {
        if !is_interesting_and_usable(&json) {
            return Ok(false);
        }
        self.enqueue(Work::from_json(json, provider)).await?;
        Ok(true)
    }

    /// Whether the dispatcher has shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

fn queue_index(provider: Option<&Provider>, queues: usize) -> usize {
    let Some(name) = provider.and_then(|p| p.name.as_deref()) else {
        return 0;
    };
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    let queues = u64::try_from(queues).unwrap_or(1).max(1);
    usize::try_from(hasher.finish() % queues).unwrap_or(0)
}

async fn run_worker(
    index: usize,
    mut rx: mpsc::Receiver<Work>,
    listeners: Arc<ListenerRegistry>,
    cancel: CancellationToken,
) {
    tracing::trace!(worker = index, "Worker started");
    loop {
        tokio::select! {
            biased;
            work = rx.recv() => match work {
                Some(work) => work.perform(listeners.as_ref()).await,
                None => break,
            },
            () = cancel.cancelled() => {
                rx.close();
                while let Some(work) = rx.recv().await {
                    work.perform(listeners.as_ref()).await;
                }
                break;
            }
        }
    }
    tracing::trace!(worker = index, "Worker stopped");
}
