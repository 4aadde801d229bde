//! Dispatch error types.

/// Errors raised by the event dispatcher.
#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    /// The dispatcher has shut down and accepts no more work.
    #[error("Dispatcher is closed")]
    Closed,

    /// A worker task ended abnormally.
    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
