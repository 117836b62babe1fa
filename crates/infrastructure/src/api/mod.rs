//! Authenticated REST client.

mod auth;
mod client;

pub use client::ApiClient;

use atrium_application::CredentialStoreError;
use atrium_domain::{AuthError, DomainError};

/// Errors from the REST client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The request failed at the transport level. Transport errors never
    /// trigger the refresh path.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Authentication could not be recovered; the cause is the refresh
    /// failure itself.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// A response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The credential store rejected a write.
    #[error("credential storage error: {0}")]
    Storage(#[from] CredentialStoreError),
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::InvalidUrl(msg) | DomainError::InvalidConfig(msg) => Self::InvalidUrl(msg),
            DomainError::Decode(msg) => Self::Decode(msg),
        }
    }
}

impl ApiError {
    pub(crate) fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error.to_string())
        }
    }
}
