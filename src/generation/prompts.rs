//! Prompt templates and output schemas.

use super::client::GenerationRequest;
use crate::session::NewSession;
use serde_json::{json, Value};

const SESSION_PLAN_SYSTEM: &str = "You are a professional therapist preparing conversation \
prompts for a supportive therapy session.";

const INSIGHT_SYSTEM: &str = "You are a compassionate AI therapist offering supportive \
insights. Never diagnose. Stick to observations and practical wellness suggestions.";

/// Request for the prompts and tags of a new session
pub fn session_plan_request(details: &NewSession) -> GenerationRequest {
    let prompt = format!(
        "You are a compassionate therapist preparing conversation prompts for a therapy session.

Session details:
- Focus area: {focus_area}
- Session type: {session_type}
- Therapy approach: {approach}
- Current mood: {mood}
- Duration: {duration} minutes

Write 5-8 open-ended questions the therapist can explore during the session. Each question should:
- Be empathetic and non-judgmental
- Invite self-reflection
- Suit the focus area and the current mood
- Stay consistent with the {approach} approach
- Avoid yes/no answers

Also produce 3-5 short tags describing the session (for example: anxiety, work-stress, relationships).",
        focus_area = details.focus_area,
        session_type = details.session_type,
        approach = details.therapy_approach,
        mood = details.mood,
        duration = details.duration,
    );

    GenerationRequest {
        name: "session plan",
        system: SESSION_PLAN_SYSTEM.to_string(),
        prompt,
        schema: session_plan_schema(),
    }
}

/// Request for the insight of a finished conversation
pub fn insight_request(formatted_transcript: &str) -> GenerationRequest {
    let prompt = format!(
        "You are a compassionate AI therapist reviewing a therapy session transcript. Offer supportive insights without diagnosing.

Transcript:
{formatted_transcript}

Report on:
- emotionalState: the overall emotional state you observe (no clinical labels)
- moodScore: emotional wellbeing from 0 (very distressed) to 100 (very positive)
- keyThemes: the main topics discussed
- copingStrategies: coping mechanisms the client mentioned, healthy or not
- recommendedActions: 3-5 concrete self-care suggestions
- finalAssessment: a supportive summary of the session

Rules:
- Never diagnose a mental health condition
- Phrase everything as observations and suggestions
- Stay empathetic and non-judgmental
- Emphasize strengths and room for growth"
    );

    GenerationRequest {
        name: "session insight",
        system: INSIGHT_SYSTEM.to_string(),
        prompt,
        schema: insight_schema(),
    }
}

fn string_array() -> Value {
    json!({"type": "ARRAY", "items": {"type": "STRING"}})
}

fn session_plan_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "prompts": string_array(),
            "tags": string_array(),
        },
        "required": ["prompts", "tags"],
    })
}

fn insight_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "emotionalState": {"type": "STRING"},
            "moodScore": {"type": "NUMBER", "minimum": 0, "maximum": 100},
            "keyThemes": string_array(),
            "copingStrategies": string_array(),
            "recommendedActions": string_array(),
            "finalAssessment": {"type": "STRING"},
        },
        "required": [
            "emotionalState",
            "moodScore",
            "keyThemes",
            "copingStrategies",
            "recommendedActions",
            "finalAssessment",
        ],
    })
}
