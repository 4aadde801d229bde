//! Listener registration and fan-out.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures_util::FutureExt;
use uuid::Uuid;

use crate::events::GerritEvent;

/// Receives classified events.
#[async_trait]
pub trait EventListener: Send + Sync {
    /// Handle one event. A panic here is logged and does not reach other
    /// listeners.
    async fn on_event(&self, event: &GerritEvent);
}

/// Delivery target for performed work.
#[async_trait]
pub trait Coordinator: Send + Sync {
    /// Deliver `event` to every registered listener.
    async fn notify_listeners(&self, event: GerritEvent);
}

/// Handle returned by listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Entry = (ListenerId, Arc<dyn EventListener>);

/// The set of registered listeners.
///
/// Notification iterates over a snapshot, so listeners may be added or
/// removed while events are being delivered.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<Vec<Entry>>,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn add(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        let id = ListenerId::new();
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        tracing::debug!(listener = %id, "Listener added");
        id
    }

    /// Deregister a listener. Returns `false` if `id` was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(entry, _)| *entry != id);
        let removed = listeners.len() < before;
        if removed {
            tracing::debug!(listener = %id, "Listener removed");
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Entry> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Coordinator for ListenerRegistry {
    async fn notify_listeners(&self, event: GerritEvent) {
        let listeners = self.snapshot();
        tracing::debug!(
            kind = %event.kind(),
            listeners = listeners.len(),
            "Notifying listeners"
        );

        for (id, listener) in listeners {
            let delivery = AssertUnwindSafe(listener.on_event(&event)).catch_unwind();
            if delivery.await.is_err() {
                tracing::error!(listener = %id, kind = %event.kind(), "Listener panicked");
            }
        }
    }
}
