//! Domain-specific error types for the rowsync client.
//!
//! All fallible operations return `Result<T, SyncError>`.
//! Bytes from the peer never cause a panic — every error is typed
//! and recoverable.

use thiserror::Error;

/// The canonical error type for the rowsync client.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── Protocol Errors ──────────────────────────────────────────
    /// The server greeting did not match `"hello, demo!"`.
    #[error("invalid server greeting")]
    InvalidGreeting,

    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value:#x}")]
    UnknownVariant { type_name: &'static str, value: u64 },

    /// A frame violated protocol rules.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// A GET_TRACK name exceeded the wire limit.
    #[error("track name too long: {len} bytes (max {max})")]
    NameTooLong { len: usize, max: usize },

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The channel to the connection's writer task was closed.
    #[error("channel closed")]
    ChannelClosed,

    // ── Serialization Errors ─────────────────────────────────────
    /// UTF-8 conversion of a track name failed.
    #[error("invalid utf-8 in track name: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    // ── Configuration Errors ─────────────────────────────────────
    /// The host supplied unusable configuration (fatal at construction).
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for SyncError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        SyncError::ChannelClosed
    }
}
