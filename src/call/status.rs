use crate::insight::{Insight, TranscriptMessage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a call is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Idle,
    Connecting,
    Active,
    Ended,
}

/// What happened after the call ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallOutcome {
    /// Insight produced and session finalized
    InsightCreated { insight: Insight },
    /// Call ended before anything was said
    NoConversation,
    /// Insight generation or persistence failed
    Failed { error: String },
}

/// Point-in-time view of a call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSnapshot {
    pub session_id: String,

    pub status: CallStatus,

    pub muted: bool,

    /// When the call session was created
    pub started_at: DateTime<Utc>,

    /// Final utterances received so far
    pub transcript: Vec<TranscriptMessage>,

    /// Last error reported by the voice client, if any
    pub last_error: Option<String>,

    pub outcome: Option<CallOutcome>,
}
