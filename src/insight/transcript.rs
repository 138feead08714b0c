use serde::{Deserialize, Serialize};

/// Role the voice agent tags the client's speech with
pub const CLIENT_ROLE: &str = "user";

/// One finalized utterance of a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    /// Speaker role as reported by the voice agent ("user", "assistant", ...)
    pub role: String,

    /// Recognized text
    pub content: String,
}

impl TranscriptMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Label used when rendering the transcript for analysis
    pub fn speaker_label(&self) -> &'static str {
        if self.role == CLIENT_ROLE {
            "Client"
        } else {
            "Therapist"
        }
    }
}

/// Render a transcript as one `Speaker: text` line per utterance
pub fn format_transcript(transcript: &[TranscriptMessage]) -> String {
    transcript
        .iter()
        .map(|msg| format!("{}: {}", msg.speaker_label(), msg.content))
        .collect::<Vec<_>>()
        .join("\n")
}
