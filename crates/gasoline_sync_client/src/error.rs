//! Error types for the sync client.

use thiserror::Error;

/// Result type for sync client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// A failed sync cycle.
///
/// Every variant feeds the same consecutive-failure counter and the
/// same fixed-interval retry; the distinction exists for logging only.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network-level failure (DNS, connect, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// Server answered outside the 2xx range.
    #[error("server returned status {status}")]
    Http {
        /// HTTP status code.
        status: u16,
    },

    /// Request or response body could not be encoded/decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The request exceeded the abort timeout.
    #[error("sync request aborted by timeout")]
    Timeout,
}

impl ClientError {
    /// Coarse classification used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Transport(_) | ClientError::Timeout => "transport",
            ClientError::Http { .. } | ClientError::Codec(_) => "protocol",
        }
    }

    /// True for every cycle failure: the loop always retries.
    pub fn is_retryable(&self) -> bool {
        true
    }
}
