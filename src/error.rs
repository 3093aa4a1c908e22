//! Error types for the RFB protocol engine.

use std::io;
use thiserror::Error;

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, VncError>;

/// Errors that can terminate a single RFB connection.
///
/// A connection-level error is caught at the session boundary and
/// translates into a clean close of that one connection; it never
/// affects the acceptor or other connections.
#[derive(Debug, Error)]
pub enum VncError {
    /// The peer closed the connection mid-frame (`recv` returned 0 while a
    /// [`crate::buffer::FramingBuffer`] was waiting for more bytes).
    #[error("peer closed the connection")]
    PeerClosed,

    /// Any other socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Buffer growth or message allocation would exceed the configured
    /// limit.
    #[error("allocation would exceed the configured limit: {0}")]
    OutOfMemory(String),

    /// An unknown message type or malformed length was received. Framing
    /// is now ambiguous, so the session cannot continue.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A known-but-unsupported request. Recoverable locally; the caller
    /// records it and continues the session.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl VncError {
    /// Whether this error is recoverable without tearing down the session.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VncError::Unsupported(_))
    }
}
