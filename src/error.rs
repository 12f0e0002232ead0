//! Error handling for the certsweep scanner
//!
//! Two families of errors live here: [`ScanError`], which the public API
//! surfaces to callers, and [`DialError`], which describes why a single
//! target produced no result. Dial errors never leave a scan task; they are
//! logged and dropped so one unreachable host cannot disturb the others.

use thiserror::Error;

/// Main error type for scanner operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scanner already closed")]
    AlreadyClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Why a single dial attempt produced no result
#[derive(Debug, Error)]
pub enum DialError {
    #[error("connect to {target} failed: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{target} timed out after {timeout_ms}ms")]
    Timeout { target: String, timeout_ms: u128 },

    #[error("TLS handshake with {target} failed: {reason}")]
    Handshake { target: String, reason: String },

    #[error("TLS setup failed: {0}")]
    TlsSetup(#[from] openssl::error::ErrorStack),
}

impl DialError {
    /// True when the remote end never accepted the TCP connection
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, DialError::Connect { .. } | DialError::Timeout { .. })
    }
}
