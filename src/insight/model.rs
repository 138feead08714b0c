use crate::store::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_MOOD_SCORE: u8 = 0;
pub const MAX_MOOD_SCORE: u8 = 100;

/// AI-generated analysis of a finished session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    pub session_id: String,

    /// e.g. "Moderate anxiety with underlying stress"
    pub emotional_state: String,

    /// Wellbeing from 0 (very distressed) to 100 (very positive)
    pub mood_score: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_themes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coping_strategies: Option<Vec<String>>,

    /// Never empty
    pub recommended_actions: Vec<String>,

    pub final_assessment: String,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Raw insight as returned by the generator, before validation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightDraft {
    pub emotional_state: String,
    pub mood_score: f64,
    #[serde(default)]
    pub key_themes: Option<Vec<String>>,
    #[serde(default)]
    pub coping_strategies: Option<Vec<String>>,
    pub recommended_actions: Vec<String>,
    pub final_assessment: String,
}

impl InsightDraft {
    /// Validate the draft and bind it to a session.
    ///
    /// Out-of-range or non-finite mood scores are rejected, fractional scores
    /// are rounded. Recommended actions must contain at least one entry.
    pub fn into_insight(
        self,
        id: String,
        session_id: String,
        created_at: DateTime<Utc>,
    ) -> Result<Insight, String> {
        let mood_score = validate_mood_score(self.mood_score)?;

        let recommended_actions = non_blank(self.recommended_actions);
        if recommended_actions.is_empty() {
            return Err("insight has no recommended actions".to_string());
        }

        Ok(Insight {
            id,
            session_id,
            emotional_state: self.emotional_state.trim().to_string(),
            mood_score,
            key_themes: self.key_themes.map(non_blank),
            coping_strategies: self.coping_strategies.map(non_blank),
            recommended_actions,
            final_assessment: self.final_assessment.trim().to_string(),
            created_at,
        })
    }
}

fn validate_mood_score(raw: f64) -> Result<u8, String> {
    if !raw.is_finite() {
        return Err(format!("moodScore {} is not a number", raw));
    }

    let rounded = raw.round();
    if rounded < f64::from(MIN_MOOD_SCORE) || rounded > f64::from(MAX_MOOD_SCORE) {
        return Err(format!(
            "moodScore {} is outside {}..={}",
            raw, MIN_MOOD_SCORE, MAX_MOOD_SCORE
        ));
    }

    Ok(rounded as u8)
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
