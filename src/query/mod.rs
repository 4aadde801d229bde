//! Gerrit queries.
//!
//! [`Query`] builds the `gerrit query` command line, [`QueryHandler`] runs it
//! over a [`LineSource`](crate::transport::LineSource) and feeds each result
//! line to a visitor.

mod builder;
mod error;
mod files;
mod runner;

pub use builder::*;
pub use error::QueryError;
pub use files::current_patch_set_files;
pub use runner::*;
