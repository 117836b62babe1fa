//! Realtime frame normalization.
//!
//! The status endpoint has emitted three wire shapes over its lifetime:
//! the current envelope (`{"statuses": [...]}`), the legacy envelope
//! (`{"integrations": [...]}`), and a bare array. Decoding tries each in
//! that fixed priority order; anything that matches none of them is
//! dropped so an isolated bad frame can never take down a long-lived
//! stream.

use serde::Deserialize;

use atrium_domain::{IntegrationStatus, LegacyIntegration};

#[derive(Debug, Deserialize)]
struct CurrentEnvelope {
    statuses: Vec<IntegrationStatus>,
}

#[derive(Debug, Deserialize)]
struct LegacyEnvelope {
    integrations: Vec<LegacyIntegration>,
}

/// Decode one stream frame into a batch of canonical status records.
///
/// Returns `None` for malformed or unrecognized frames; callers drop those
/// without surfacing an error.
#[must_use]
pub fn decode_status_frame(data: &str) -> Option<Vec<IntegrationStatus>> {
    if let Ok(envelope) = serde_json::from_str::<CurrentEnvelope>(data) {
        return Some(envelope.statuses);
    }

    if let Ok(envelope) = serde_json::from_str::<LegacyEnvelope>(data) {
        return Some(
            envelope
                .integrations
                .into_iter()
                .map(IntegrationStatus::from)
                .collect(),
        );
    }

    if let Ok(statuses) = serde_json::from_str::<Vec<IntegrationStatus>>(data) {
        return Some(statuses);
    }

    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atrium_domain::IntegrationState;
    use pretty_assertions::assert_eq;

    use super::*;

    const CURRENT_FRAME: &str = r#"{
        "statuses": [
            {"id": "i1", "integration": "github", "state": "connected"},
            {"id": "i2", "integration": "slack", "state": "disconnected"}
        ]
    }"#;

    const LEGACY_FRAME: &str = r#"{
        "integrations": [
            {"name": "jira", "connected": true},
            {"name": "linear"}
        ]
    }"#;

    const BARE_ARRAY_FRAME: &str = r#"[
        {"id": "i3", "integration": "pagerduty", "state": "degraded"}
    ]"#;

    #[test]
    fn test_current_shape_forwarded_unchanged() {
        let batch = decode_status_frame(CURRENT_FRAME).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id, "i1");
        assert_eq!(batch[0].state, IntegrationState::Connected);
    }

    #[test]
    fn test_legacy_shape_mapped() {
        let batch = decode_status_frame(LEGACY_FRAME).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].integration, "jira");
        assert_eq!(batch[0].state, IntegrationState::Connected);
        assert_eq!(batch[1].state, IntegrationState::Unknown);
    }

    #[test]
    fn test_bare_array_already_canonical() {
        let batch = decode_status_frame(BARE_ARRAY_FRAME).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].state, IntegrationState::Degraded);
    }

    #[test]
    fn test_current_shape_wins_over_legacy() {
        let both = r#"{
            "statuses": [{"id": "i1", "integration": "github"}],
            "integrations": [{"name": "jira"}]
        }"#;
        let batch = decode_status_frame(both).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, "i1");
    }

    #[test]
    fn test_malformed_frames_dropped() {
        assert_eq!(decode_status_frame("not json"), None);
        assert_eq!(decode_status_frame("{}"), None);
        assert_eq!(decode_status_frame("42"), None);
        assert_eq!(decode_status_frame(r#"{"unrelated": []}"#), None);
    }

    #[test]
    fn test_frame_sequence_tolerance() {
        // Four frames in: current, legacy, bare array, malformed.
        // Exactly three batches out, in order.
        let frames = [CURRENT_FRAME, LEGACY_FRAME, BARE_ARRAY_FRAME, "{}"];
        let batches: Vec<_> = frames.iter().filter_map(|f| decode_status_frame(f)).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0][0].integration, "github");
        assert_eq!(batches[1][0].integration, "jira");
        assert_eq!(batches[2][0].integration, "pagerduty");
    }
}
