// =============================================================================
// error.rs: WHAT CAN GO WRONG AT SEA
// =============================================================================
//
// Three failures the dashboard always knew about (upstream status, nothing
// found, language model down) plus the two that come with doing HTTP in Rust
// properly: the request never got a status at all, or the body was not the
// JSON we were promised.
//
// None of these are meant to reach the user raw. The executor turns them into
// result values and the narrative generator turns a dead language model into
// a degraded text answer.
// =============================================================================

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaritimeError {
    /// The tracking API answered with a non-success status.
    #[error("tracking API returned HTTP {status} for {endpoint}")]
    Upstream { endpoint: String, status: u16 },

    /// A lookup that should have produced one record produced none.
    #[error("not found: {0}")]
    NotFound(String),

    /// The generative-language call failed for any reason.
    #[error("language model unavailable: {0}")]
    Service(String),

    /// The request never produced an HTTP status (DNS, connect, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body came back but was not the JSON shape we expected.
    #[error("could not decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Short machine-readable tag for an error, carried inside result values and
/// counted by the metrics collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Upstream,
    NotFound,
    Service,
    Transport,
    Decode,
}

impl MaritimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MaritimeError::Upstream { .. } => ErrorKind::Upstream,
            MaritimeError::NotFound(_) => ErrorKind::NotFound,
            MaritimeError::Service(_) => ErrorKind::Service,
            MaritimeError::Transport(_) => ErrorKind::Transport,
            MaritimeError::Decode { .. } => ErrorKind::Decode,
        }
    }

    /// HTTP status code for upstream failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            MaritimeError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MaritimeError>;
