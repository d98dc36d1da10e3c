// src/ingest/error.rs
use thiserror::Error;

/// Why a refresh failed. Callers recover the same way for every variant;
/// the distinction only feeds logs and metrics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Proxy unreachable, timed out, non-2xx, or reported `status: "error"`.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    /// Body is not JSON or has no `items` array.
    #[error("malformed upstream payload: {0}")]
    MalformedPayload(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::UpstreamUnavailable(_) => "upstream_unavailable",
            FetchError::MalformedPayload(_) => "malformed_payload",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::UpstreamUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::MalformedPayload(e.to_string())
    }
}
