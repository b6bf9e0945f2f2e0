//! Error types for hexterm sessions.
//!
//! Only conditions that end a session are errors here. Malformed console
//! hex and spam verification failures are reported and the session keeps
//! going; see [`crate::codec::ParsedHex`] and [`SpamError`].

use thiserror::Error;

/// Fatal session error, returned to whoever set up the transport.
#[derive(Debug, Error)]
pub enum HextermError {
    // ── Transport Errors ─────────────────────────────────────────
    /// The transport read failed or reached end of stream.
    #[error("transport read failed: {0}")]
    ReadFailed(#[source] std::io::Error),

    /// The transport write failed outright.
    #[error("transport write of {expected} bytes failed: {source}")]
    WriteFailed {
        expected: usize,
        #[source]
        source: std::io::Error,
    },

    /// The transport accepted fewer bytes than requested.
    #[error("short write: only {written} of {expected} bytes written")]
    ShortWrite { written: usize, expected: usize },

    /// Waiting for readiness on the transport failed.
    #[error("readiness wait failed: {0}")]
    WaitFailed(#[source] std::io::Error),

    // ── Setup Errors ─────────────────────────────────────────────
    /// A configuration value is out of range or unparseable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Plain I/O error outside the session loop (binding, connecting, spawning).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl HextermError {
    /// `true` when the transport reported end of stream rather than a
    /// genuine failure.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::ReadFailed(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

impl From<&str> for HextermError {
    fn from(s: &str) -> Self {
        HextermError::InvalidConfig(s.to_string())
    }
}

// ── SpamError ─────────────────────────────────────────────────────

/// Why a received buffer failed spam verification.
///
/// These are diagnostics, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpamError {
    #[error("buf length is too short for header ({0} bytes)")]
    TooShort(usize),

    #[error("advertised buf length ({advertised} bytes) doesn't match actual buf length ({actual} bytes)")]
    LengthMismatch { advertised: u32, actual: usize },

    #[error("unexpected byte at position {offset}: expected {expected}, got {actual}")]
    UnexpectedByte { offset: usize, expected: u8, actual: u8 },
}

impl SpamError {
    /// Offset of the offending byte, when the failure is in the payload.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::UnexpectedByte { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
