//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

const fn default_timeout() -> u64 {
    30
}

/// Endpoints and limits for one console backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for REST calls, e.g. `https://api.atrium.dev`.
    pub api_base_url: String,
    /// URL of the integration-status event stream.
    pub events_url: String,
    /// URL of the chat socket (ws:// or wss://).
    pub chat_socket_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            events_url: String::new(),
            chat_socket_url: String::new(),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given API base URL.
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Default::default()
        }
    }

    /// Set the event stream URL.
    #[must_use]
    pub fn with_events_url(mut self, url: impl Into<String>) -> Self {
        self.events_url = url.into();
        self
    }

    /// Set the chat socket URL.
    #[must_use]
    pub fn with_chat_socket_url(mut self, url: impl Into<String>) -> Self {
        self.chat_socket_url = url.into();
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Per-request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configured URLs.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidConfig`] if the API base URL is not
    /// http(s), or if a non-empty socket URL is not ws(s).
    pub fn validate(&self) -> DomainResult<()> {
        let base = Url::parse(&self.api_base_url)
            .map_err(|e| DomainError::InvalidConfig(format!("api_base_url: {e}")))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(DomainError::InvalidConfig(
                "api_base_url must be http or https".to_string(),
            ));
        }

        if !self.chat_socket_url.is_empty()
            && !self.chat_socket_url.starts_with("ws://")
            && !self.chat_socket_url.starts_with("wss://")
        {
            return Err(DomainError::InvalidConfig(
                "chat_socket_url must start with ws:// or wss://".to_string(),
            ));
        }

        Ok(())
    }
}
