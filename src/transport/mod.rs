//! Remote command transport.
//!
//! The rest of the crate only sees [`LineSource`] and [`LineStream`]: execute a
//! command, get its output back one line at a time. [`ProcessLineSource`] is the
//! stock implementation, running commands through `ssh`.

mod error;
mod process;

use async_trait::async_trait;

pub use error::TransportError;
pub use process::*;

/// An open command whose output is consumed line by line.
///
/// Lines are yielded in the order the remote process emitted them.
#[async_trait]
pub trait LineStream: Send {
    /// Read the next line, without its terminator.
    ///
    /// Returns `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the read fails or the session dropped.
    async fn next_line(&mut self) -> Result<Option<String>, TransportError>;

    /// Release the underlying session. Safe to call more than once.
    async fn close(&mut self);
}

/// Something that can execute a command and hand back its output stream.
#[async_trait]
pub trait LineSource: Send + Sync {
    /// Execute `command` and return its output stream.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the session cannot be opened.
    async fn open(&self, command: &str) -> Result<Box<dyn LineStream>, TransportError>;
}
