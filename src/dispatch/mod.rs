//! Event dispatch.
//!
//! Producers wrap incoming payloads in [`Work`] units and enqueue them on an
//! [`EventDispatcher`]. Worker tasks perform each unit: classify it, stamp it
//! and notify every registered [`EventListener`].

mod dispatcher;
mod error;
mod listener;
mod work;

pub use dispatcher::*;
pub use error::DispatchError;
pub use listener::*;
pub use work::*;
