//! Transport error types.

/// Errors raised while opening or reading a remote line stream.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// The transport program was not found.
    #[error("Transport program not found: {0}")]
    NotFound(String),

    /// Permission denied when spawning the transport program.
    #[error("Permission denied spawning {0}")]
    PermissionDenied(String),

    /// The remote session could not be established.
    #[error("Connection failed: {stderr}")]
    ConnectionFailed { stderr: String },

    /// The stream was closed while a read was in progress.
    #[error("Stream closed")]
    Closed,

    /// Process stdout was not captured.
    #[error("Process stdout not available")]
    NoStdout,

    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Create a `TransportError` from a spawn I/O error, classifying common cases.
    pub(crate) fn from_spawn(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_string()),
            _ => Self::Io(err),
        }
    }
}
