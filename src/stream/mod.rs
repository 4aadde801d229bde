//! `gerrit stream-events` ingestion.
//!
//! Every line Gerrit pushes on the event stream becomes a raw [`Work`] unit.
//! Parsing and classification happen later, on the dispatcher's workers, so
//! the reader only waits on the stream and on queue space.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::dispatch::{DispatchError, DispatchSender, Work};
use crate::events::Provider;
use crate::transport::{LineSource, LineStream, TransportError};

/// Command opening the server's event stream.
pub const STREAM_EVENTS_COMMAND: &str = "gerrit stream-events";

/// Errors that end stream ingestion.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Reads one server's event stream into a dispatcher.
pub struct StreamEventsReader {
    source: Arc<dyn LineSource>,
    provider: Option<Provider>,
    sender: DispatchSender,
}

impl std::fmt::Debug for StreamEventsReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamEventsReader")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl StreamEventsReader {
    /// Create a reader whose units are stamped with `provider`.
    #[must_use]
    pub fn new(
        source: Arc<dyn LineSource>,
        provider: Option<Provider>,
        sender: DispatchSender,
    ) -> Self {
        Self {
            source,
            provider,
            sender,
        }
    }

    /// Read until end of stream, a failure, or `cancel` fires.
    ///
    /// Returns the number of units enqueued. The stream is closed on every
    /// path. Cancellation is observed between lines: a line already read is
    /// still enqueued, and units already enqueued stay queued.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Transport` if the stream cannot be opened or
    /// read, and `StreamError::Dispatch` if the dispatcher shut down.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<u64, StreamError> {
        tracing::info!(provider = ?self.provider_name(), "Opening event stream");
        let mut stream = self.source.open(STREAM_EVENTS_COMMAND).await?;
        let result = self.pump(stream.as_mut(), cancel).await;
        stream.close().await;

        match &result {
            Ok(count) => tracing::info!(enqueued = count, "Event stream ended"),
            Err(e) => tracing::warn!(error = %e, "Event stream failed"),
        }
        result
    }

    async fn pump(
        &self,
        stream: &mut dyn LineStream,
        cancel: &CancellationToken,
    ) -> Result<u64, StreamError> {
        let mut enqueued = 0;
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::debug!("Event stream cancelled");
                    return Ok(enqueued);
                }
                next = stream.next_line() => next?,
            };
            let Some(line) = next else {
                return Ok(enqueued);
            };

            tracing::trace!(line = %line, "Incoming event");
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // A built unit is always enqueued; only a closed dispatcher refuses it.
            let work = Work::from_line(line, self.provider.clone());
            self.sender.enqueue(work).await?;
            enqueued += 1;
        }
    }

    fn provider_name(&self) -> Option<&str> {
        self.provider.as_ref().and_then(|p| p.name.as_deref())
    }
}
