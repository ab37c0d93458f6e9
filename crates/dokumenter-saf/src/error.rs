//! Error types for the SAF client.

use crate::types::DownstreamStatus;

/// SAF client errors.
#[derive(Debug, thiserror::Error)]
pub enum SafError {
    /// The on-behalf-of exchange was refused or the identity provider was unreachable.
    #[error("token exchange failed: {message}")]
    TokenExchange { message: String },

    /// SAF answered with a non-success status.
    #[error("downstream rejected the request: {0}")]
    Downstream(DownstreamStatus),

    /// Network error.
    #[error("network error: {message}")]
    Network { message: String },

    /// The request did not complete within the configured timeout.
    #[error("timed out: {message}")]
    Timeout { message: String },

    /// Invalid response from SAF.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl SafError {
    /// Whether the error is a transient transport failure worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }
}

impl From<reqwest::Error> for SafError {
    fn from(err: reqwest::Error) -> Self {
        // Strip the URL: it carries citizen and document identifiers.
        let err = err.without_url();
        if err.is_timeout() {
            Self::Timeout {
                message: err.to_string(),
            }
        } else {
            Self::Network {
                message: err.to_string(),
            }
        }
    }
}

/// Result type for SAF operations.
pub type SafResult<T> = Result<T, SafError>;
