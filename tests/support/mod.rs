//! Test doubles shared by the integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gerrit_events::dispatch::{Coordinator, EventListener};
use gerrit_events::events::GerritEvent;
use gerrit_events::transport::{LineSource, LineStream, TransportError};
use tokio::sync::{Notify, Semaphore};

/// Line source replaying canned output.
#[derive(Default)]
pub struct FakeSource {
    lines: Vec<String>,
    fail_after: Option<usize>,
    pub commands: Mutex<Vec<String>>,
    pub closed: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| (*l).to_string()).collect(),
            ..Default::default()
        }
    }

    /// Fail with `TransportError::Closed` after yielding `count` lines.
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn last_command(&self) -> Option<String> {
        self.commands.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LineSource for FakeSource {
    async fn open(&self, command: &str) -> Result<Box<dyn LineStream>, TransportError> {
        self.commands.lock().unwrap().push(command.to_string());
        Ok(Box::new(FakeStream {
            lines: self.lines.iter().cloned().collect(),
            remaining_before_failure: self.fail_after,
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct FakeStream {
    lines: VecDeque<String>,
    remaining_before_failure: Option<usize>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl LineStream for FakeStream {
    async fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        if let Some(remaining) = self.remaining_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(TransportError::Closed);
            }
            *remaining -= 1;
        }
        Ok(self.lines.pop_front())
    }

    async fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Line source whose stream never yields.
pub struct PendingSource {
    pub closed: Arc<AtomicUsize>,
}

#[async_trait]
impl LineSource for PendingSource {
    async fn open(&self, _command: &str) -> Result<Box<dyn LineStream>, TransportError> {
        Ok(Box::new(PendingStream {
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct PendingStream {
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl LineStream for PendingStream {
    async fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        std::future::pending().await
    }

    async fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Line source that cannot be opened.
pub struct UnreachableSource;

#[async_trait]
impl LineSource for UnreachableSource {
    async fn open(&self, _command: &str) -> Result<Box<dyn LineStream>, TransportError> {
        Err(TransportError::ConnectionFailed {
            stderr: "Connection refused".to_string(),
        })
    }
}

/// Records every event it is notified of, both as a coordinator and as a
/// listener.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<GerritEvent>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<GerritEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn change_numbers(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| e.change().and_then(|c| c.number.clone()))
            .collect()
    }
}

#[async_trait]
impl Coordinator for Recorder {
    async fn notify_listeners(&self, event: GerritEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl EventListener for Recorder {
    async fn on_event(&self, event: &GerritEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Listener that blocks each delivery until a permit is released, then
/// records the event.
pub struct Gate {
    pub entered: Notify,
    pub release: Semaphore,
    pub seen: Recorder,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
            seen: Recorder::default(),
        }
    }
}

#[async_trait]
impl EventListener for Gate {
    async fn on_event(&self, event: &GerritEvent) {
        self.entered.notify_one();
        if let Ok(permit) = self.release.acquire().await {
            permit.forget();
        }
        self.seen.on_event(event).await;
    }
}

/// A `patchset-created` line for change `number`.
pub fn patchset_created(number: u32) -> String {
    format!(
        r#"{{"type":"patchset-created","change":{{"project":"p","branch":"master","id":"I{number}","number":{number}}},"patchSet":{{"number":1,"revision":"rev{number}"}},"uploader":{{"name":"Bobby","email":"bobby@example.com"}}}}"#
    )
}
