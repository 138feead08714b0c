use crate::store::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A therapy session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Store-assigned document id
    pub id: String,

    /// Owner; never changes after creation
    pub user_id: String,

    /// e.g. "Anxiety Management", "Grief & Loss"
    pub focus_area: String,

    /// e.g. "First Session", "Follow-up"
    pub session_type: String,

    /// e.g. "CBT", "Mindfulness"
    pub therapy_approach: String,

    /// Mood reported when the session was created
    pub mood: String,

    /// Planned length in minutes
    pub duration: u32,

    /// Conversation prompts generated at creation
    pub prompts: Vec<String>,

    /// Topical tags generated at creation
    pub tags: Vec<String>,

    /// Set once the session's insight has been produced
    pub finalized: bool,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// User-chosen settings for a new session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub focus_area: String,
    pub session_type: String,
    pub therapy_approach: String,
    pub mood: String,
    pub duration: u32,
}

impl NewSession {
    /// Reject blank fields and a zero duration
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("focusArea", &self.focus_area),
            ("sessionType", &self.session_type),
            ("therapyApproach", &self.therapy_approach),
            ("mood", &self.mood),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(format!("{} is required", name));
            }
        }

        if self.duration == 0 {
            return Err("duration must be a positive number of minutes".to_string());
        }

        Ok(())
    }
}

/// Generated conversation plan for a new session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPlan {
    pub prompts: Vec<String>,
    pub tags: Vec<String>,
}

impl SessionPlan {
    /// Normalize generated output: trim entries, drop blanks, dedupe tags.
    ///
    /// A plan without any usable prompt is rejected.
    pub fn normalized(self) -> Result<Self, String> {
        let prompts: Vec<String> = self
            .prompts
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        if prompts.is_empty() {
            return Err("generated plan contains no prompts".to_string());
        }

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim().to_string();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        Ok(Self { prompts, tags })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> NewSession {
        NewSession {
            focus_area: "Stress Management".to_string(),
            session_type: "Follow-up".to_string(),
            therapy_approach: "Mindfulness".to_string(),
            mood: "stressed".to_string(),
            duration: 45,
        }
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut blank_mood = details();
        blank_mood.mood = "   ".to_string();
        assert_eq!(blank_mood.validate().unwrap_err(), "mood is required");

        let mut zero = details();
        zero.duration = 0;
        assert!(zero.validate().is_err());

        // Any positive duration is accepted, not only the UI presets
        let mut odd = details();
        odd.duration = 50;
        assert!(odd.validate().is_ok());
    }

    #[test]
    fn plan_normalization_drops_blanks_and_duplicate_tags() {
        let plan = SessionPlan {
            prompts: vec![" What brings you here? ".to_string(), "".to_string()],
            tags: vec!["stress".to_string(), "stress".to_string(), " ".to_string(), "work".to_string()],
        }
        .normalized()
        .unwrap();

        assert_eq!(plan.prompts, vec!["What brings you here?"]);
        assert_eq!(plan.tags, vec!["stress", "work"]);
    }

    #[test]
    fn plan_without_prompts_is_rejected() {
        let plan = SessionPlan {
            prompts: vec!["  ".to_string()],
            tags: vec!["x".to_string()],
        };
        assert!(plan.normalized().is_err());
    }

    #[test]
    fn session_serializes_camel_case() {
        let json = serde_json::to_value(details()).unwrap();
        assert!(json.get("focusArea").is_some());
        assert!(json.get("therapyApproach").is_some());
    }
}
