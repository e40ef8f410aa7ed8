//! Upload lifecycle state and the event payloads sent to the host UI.

use serde::Serialize;

use crate::models::verdict::{DurationVerdict, ValidationVerdict};

/// Lifecycle of one user-facing upload control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UploadState {
    Idle,
    /// A file is selected. Transfer is armed only once validation and the
    /// duration check both permit it; otherwise the selection is shown but
    /// the transfer action stays disabled.
    FileSelected,
    Uploading,
    Success,
    Error,
}

/// Identifiers the transfer collaborator needs to route the upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    /// Backend identifier of the session record this audio belongs to.
    pub session_id: String,
}

impl UploadTarget {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}

/// Full controller snapshot, emitted on every state transition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSnapshot {
    pub state: UploadState,
    pub file_name: Option<String>,
    pub bytes_sent: u64,
    pub bytes_total: u64,
    pub validation: Option<ValidationVerdict>,
    pub duration: Option<DurationVerdict>,
    pub error_message: Option<String>,
}

impl UploadSnapshot {
    pub fn idle() -> Self {
        Self {
            state: UploadState::Idle,
            file_name: None,
            bytes_sent: 0,
            bytes_total: 0,
            validation: None,
            duration: None,
            error_message: None,
        }
    }
}

/// Progress tick for an in-flight transfer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPayload {
    pub attempt_id: String,
    pub bytes_sent: u64,
    pub bytes_total: u64,
}

/// Events broadcast to host listeners.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum UploadEvent {
    #[serde(rename = "upload:state")]
    State(UploadSnapshot),
    #[serde(rename = "upload:progress")]
    Progress(ProgressPayload),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_camel_case() {
        let json = serde_json::to_value(UploadState::FileSelected).unwrap();
        assert_eq!(json, "fileSelected");
    }

    #[test]
    fn test_idle_snapshot_is_empty() {
        let snap = UploadSnapshot::idle();
        assert_eq!(snap.state, UploadState::Idle);
        assert!(snap.file_name.is_none());
        assert_eq!(snap.bytes_sent, 0);
        assert!(snap.validation.is_none());
        assert!(snap.duration.is_none());
    }

    #[test]
    fn test_progress_event_serde_shape() {
        let event = UploadEvent::Progress(ProgressPayload {
            attempt_id: "a".repeat(32),
            bytes_sent: 512,
            bytes_total: 1024,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "upload:progress");
        assert_eq!(json["payload"]["bytesSent"], 512);
        assert_eq!(json["payload"]["bytesTotal"], 1024);
    }

    #[test]
    fn test_state_event_serde_shape() {
        let event = UploadEvent::State(UploadSnapshot::idle());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "upload:state");
        assert_eq!(json["payload"]["state"], "idle");
    }
}
