//! Review posting over the Gerrit REST API.

mod listener;
mod poster;
mod review;

pub use listener::*;
pub use poster::*;
pub use review::*;
