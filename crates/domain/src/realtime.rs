//! Realtime integration-status events.
//!
//! The status stream has gone through several wire formats; everything the
//! transport decodes is normalized into [`IntegrationStatus`] before it
//! reaches application code. The legacy record shape is kept only as a
//! decode source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connection state of one integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationState {
    /// Integration is connected and healthy.
    Connected,
    /// Integration is connected but reporting problems.
    Degraded,
    /// Integration is disconnected.
    Disconnected,
    /// State not reported by the server.
    #[default]
    Unknown,
}

impl IntegrationState {
    /// Returns true if the integration is usable (connected or degraded).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Connected | Self::Degraded)
    }
}

/// Canonical status record for one integration, the single shape every
/// decoded stream frame is normalized into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationStatus {
    /// Server-side identifier of the integration.
    pub id: String,
    /// Provider name, e.g. `"github"` or `"slack"`.
    pub integration: String,
    /// Current connection state.
    #[serde(default)]
    pub state: IntegrationState,
    /// Human-readable detail, e.g. the last error message.
    #[serde(default)]
    pub detail: Option<String>,
    /// When the integration last synced, if known.
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Record shape emitted by the pre-rework status endpoint.
///
/// Absent fields map to the `Unknown` sentinel or `None` on the canonical
/// record; see [`IntegrationStatus::from`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LegacyIntegration {
    /// Provider name; doubled as the identifier in the legacy shape.
    pub name: String,
    /// Whether the integration was connected, if reported.
    #[serde(default)]
    pub connected: Option<bool>,
    /// Last sync time, if reported.
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    /// Last error message, if any.
    #[serde(default)]
    pub error: Option<String>,
}

impl From<LegacyIntegration> for IntegrationStatus {
    fn from(legacy: LegacyIntegration) -> Self {
        let state = match legacy.connected {
            Some(true) if legacy.error.is_some() => IntegrationState::Degraded,
            Some(true) => IntegrationState::Connected,
            Some(false) => IntegrationState::Disconnected,
            None => IntegrationState::Unknown,
        };

        Self {
            id: legacy.name.clone(),
            integration: legacy.name,
            state,
            detail: legacy.error,
            last_synced_at: legacy.last_sync,
        }
    }
}

/// Stream transport failures, surfaced at most once per subscription.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The connection could not be established.
    #[error("stream connect failed: {0}")]
    Connect(String),

    /// The established connection failed mid-stream.
    #[error("stream transport error: {0}")]
    Transport(String),

    /// The server closed the stream.
    #[error("stream closed by server")]
    Closed,
}

/// What a status-stream subscriber receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// One decoded frame: a batch of canonical status records.
    Batch(Vec<IntegrationStatus>),
    /// Terminal transport failure; nothing follows this event.
    Error(StreamError),
}
