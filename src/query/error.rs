//! Query error types.

use crate::transport::TransportError;

/// Errors raised by Gerrit queries.
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    /// Gerrit answered with an in-band error record.
    #[error("Gerrit query error: {message}")]
    Remote { message: String },

    /// A result line was not a JSON object.
    #[error("Malformed query record: {reason}")]
    MalformedRecord { line: String, reason: String },

    /// The query was cancelled before the result was exhausted.
    #[error("Query cancelled")]
    Cancelled,

    /// The command channel failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}
