//! Gateway errors.

use pagedesk_shared::AppError;
use thiserror::Error;

/// Errors raised by Graph API calls.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The call did not complete within the configured timeout.
    #[error("graph api request timed out")]
    Timeout,

    /// The request could not be sent or the connection failed.
    #[error("graph api transport error: {0}")]
    Transport(String),

    /// The upstream answered with a non-2xx status.
    #[error("graph api returned {status}: {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Raw response body, for logs only.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected graph api response: {0}")]
    Decode(String),

    /// The client could not be built from its configuration.
    #[error("invalid graph api configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Upstream status code, if the upstream answered.
    #[must_use]
    pub const fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        Self::ExternalService(err.to_string())
    }
}
