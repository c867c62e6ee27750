//! Error types for the yacode library.

use thiserror::Error;

/// The main error type for yacode operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame encoding/decoding error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// JSON payload could not be built or parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation timed out.
    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Connection is not established.
    #[error("not connected")]
    NotConnected,

    /// The device closed the connection.
    #[error("connection closed by device")]
    ConnectionClosed,

    /// Endpoint string could not be parsed.
    #[error("invalid endpoint: {reason}")]
    InvalidEndpoint { reason: String },
}

impl Error {
    /// Builds a timeout error from a duration.
    #[must_use]
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Returns true if this error means the socket is no longer usable.
    #[must_use]
    pub const fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ConnectionClosed)
    }
}

/// Frame-specific errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Buffer too short to contain the frame header.
    #[error("frame too short: need at least {needed} bytes, got {got}")]
    TooShort { needed: usize, got: usize },

    /// First byte is not the start-of-frame marker.
    #[error("bad start marker: 0x{0:02x}")]
    BadMarker(u8),

    /// Command code is not part of the device contract.
    #[error("unknown command code: 0x{0:04x}")]
    UnknownCommand(u16),

    /// Declared payload length exceeds the bytes available.
    #[error("incomplete frame: expected {expected} payload bytes, got {got}")]
    Incomplete { expected: usize, got: usize },

    /// Payload is not followed by the end-of-frame marker.
    #[error("missing end-of-frame marker")]
    MissingTerminator,

    /// Payload is not valid UTF-8 text.
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Result type alias for yacode operations.
pub type Result<T> = std::result::Result<T, Error>;
