use crate::insight::TranscriptMessage;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Lifecycle event emitted by a voice call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum CallEvent {
    /// The call became active
    CallStart,
    /// The call terminated (either party, or after an error)
    CallEnd,
    /// One unit of recognized speech or other agent message
    Message(VoiceMessage),
    /// Terminal failure; the call is torn down
    Error(String),
}

/// Message payload delivered by the voice agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceMessage {
    /// Message kind ("transcript", "function-call", ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// "partial" or "final" for transcript messages
    #[serde(default)]
    pub transcript_type: Option<String>,

    /// Speaker role ("user", "assistant")
    #[serde(default)]
    pub role: Option<String>,

    /// Recognized text
    #[serde(default)]
    pub transcript: Option<String>,
}

impl VoiceMessage {
    /// Final transcript fragment for a known speaker
    pub fn is_final_transcript(&self) -> bool {
        self.kind == "transcript"
            && self.transcript_type.as_deref() == Some("final")
            && self.role.is_some()
            && self.transcript.is_some()
    }

    /// Convert a final transcript fragment into a transcript entry
    pub fn to_transcript_message(&self) -> Option<TranscriptMessage> {
        if !self.is_final_transcript() {
            return None;
        }
        let role = self.role.clone()?;
        let content = self.transcript.clone()?;
        Some(TranscriptMessage { role, content })
    }
}

/// Voice call client trait
///
/// Implementations:
/// - `RelayVoiceClient`: events relayed over HTTP by the browser that owns the audio
/// - Test doubles scripting an event sequence
#[async_trait::async_trait]
pub trait VoiceClient: Send + Sync {
    /// Start a call with the given assistant
    ///
    /// Returns a channel receiver that will receive the call's events
    async fn start(&self, assistant_id: &str) -> Result<mpsc::Receiver<CallEvent>>;

    /// Request the call to end; teardown completes asynchronously with `CallEnd`
    fn stop(&self);

    /// Mute or unmute the local microphone
    fn set_muted(&self, muted: bool);

    /// Get client name for logging
    fn name(&self) -> &str;
}
