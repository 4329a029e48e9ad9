use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConversationRow {
    pub id: Uuid,
    pub applicant_email: String,
    pub job_id: i64,
    pub history: Json<Vec<HistoryEntry>>,
    pub status: String,
    pub call_sid: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// One event in a conversation's history. Appended on every status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub event: String,
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn now(event: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            event: event.into(),
            detail,
            at: Utc::now(),
        }
    }
}

/// Lifecycle of an outbound call.
///
/// `initiating` is set locally before the provider is contacted; every later
/// state arrives from the provider's status callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Initiating,
    Initiated,
    Ringing,
    Answered,
    Completed,
    Failed,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Initiating => "initiating",
            CallStatus::Initiated => "initiated",
            CallStatus::Ringing => "ringing",
            CallStatus::Answered => "answered",
            CallStatus::Completed => "completed",
            CallStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initiating" => Some(CallStatus::Initiating),
            "initiated" => Some(CallStatus::Initiated),
            "ringing" => Some(CallStatus::Ringing),
            "answered" => Some(CallStatus::Answered),
            "completed" => Some(CallStatus::Completed),
            "failed" => Some(CallStatus::Failed),
            _ => None,
        }
    }

    /// Maps a telephony provider call status onto the local lifecycle.
    pub fn from_provider(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "queued" | "initiated" => Some(CallStatus::Initiated),
            "ringing" => Some(CallStatus::Ringing),
            "in-progress" | "answered" => Some(CallStatus::Answered),
            "completed" => Some(CallStatus::Completed),
            "busy" | "no-answer" | "canceled" | "failed" => Some(CallStatus::Failed),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CallStatus::Initiating => 0,
            CallStatus::Initiated => 1,
            CallStatus::Ringing => 2,
            CallStatus::Answered => 3,
            CallStatus::Completed | CallStatus::Failed => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStatus::Completed | CallStatus::Failed)
    }

    /// Callbacks can arrive out of order; a conversation only ever moves forward.
    pub fn can_transition_to(&self, next: CallStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_status_mapping() {
        assert_eq!(CallStatus::from_provider("queued"), Some(CallStatus::Initiated));
        assert_eq!(CallStatus::from_provider("ringing"), Some(CallStatus::Ringing));
        assert_eq!(
            CallStatus::from_provider("in-progress"),
            Some(CallStatus::Answered)
        );
        assert_eq!(
            CallStatus::from_provider("Completed"),
            Some(CallStatus::Completed)
        );
        assert_eq!(CallStatus::from_provider("no-answer"), Some(CallStatus::Failed));
        assert_eq!(CallStatus::from_provider("teleporting"), None);
    }

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(CallStatus::Initiating.can_transition_to(CallStatus::Initiated));
        assert!(CallStatus::Initiated.can_transition_to(CallStatus::Ringing));
        assert!(CallStatus::Initiated.can_transition_to(CallStatus::Completed));
        assert!(CallStatus::Ringing.can_transition_to(CallStatus::Answered));
        assert!(CallStatus::Answered.can_transition_to(CallStatus::Completed));
    }

    #[test]
    fn test_stale_callbacks_do_not_move_backwards() {
        assert!(!CallStatus::Answered.can_transition_to(CallStatus::Ringing));
        assert!(!CallStatus::Ringing.can_transition_to(CallStatus::Ringing));
        assert!(!CallStatus::Completed.can_transition_to(CallStatus::Failed));
        assert!(!CallStatus::Failed.can_transition_to(CallStatus::Completed));
    }

    #[test]
    fn test_status_str_roundtrip() {
        for status in [
            CallStatus::Initiating,
            CallStatus::Initiated,
            CallStatus::Ringing,
            CallStatus::Answered,
            CallStatus::Completed,
            CallStatus::Failed,
        ] {
            assert_eq!(CallStatus::parse(status.as_str()), Some(status));
        }
    }
}
