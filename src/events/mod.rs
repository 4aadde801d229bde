//! Gerrit event model.
//!
//! Incoming JSON is classified by its `type` attribute into a closed set of
//! [`EventKind`]s. Unknown kinds are dropped rather than rejected, so newer
//! servers and plugins can add events without breaking ingestion.

mod attrs;
mod classify;
mod event;
mod kind;

pub use attrs::*;
pub use classify::*;
pub use event::*;
pub use kind::*;
