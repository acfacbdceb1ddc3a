// src/core/error.rs

use thiserror::Error;

/// Failure of a single call to an external collaborator (resolver, HTTP
/// endpoint, TLS handshake).
///
/// These never cross a phase boundary: the phase that owns the call logs the
/// error and leaves the affected field absent.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("request timed out")]
    Timeout,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Parse(String),
    #[error("DNS error: {0}")]
    Dns(String),
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("every relay endpoint failed")]
    AllRelaysFailed,
}

impl From<serde_json::Error> for CollectorError {
    fn from(e: serde_json::Error) -> Self {
        CollectorError::Parse(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for CollectorError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        CollectorError::Timeout
    }
}

/// Errors that end a scan outright.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The only input-driven failure: nothing runs after it.
    #[error("invalid domain '{input}': {reason}")]
    InvalidDomain { input: String, reason: &'static str },
    #[error("scan failed: {0}")]
    Internal(String),
}
