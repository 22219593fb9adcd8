//! Error types for the lobby protocol library.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Framing-level protocol errors.
///
/// These are fatal for the connection that produced them. Malformed input is
/// not an error: the codec reports it as a frame and keeps going.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// An I/O error occurred on the underlying stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
