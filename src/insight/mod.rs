//! Post-call insight generation
//!
//! This module provides the `InsightManager` that handles:
//! - Transcript validation and formatting
//! - Ownership checks against the session record
//! - Generation and validation of the insight
//! - Atomic insight write plus session finalization

mod manager;
mod model;
mod transcript;

pub use manager::{CreateInsight, InsightManager};
pub use model::{Insight, InsightDraft, MAX_MOOD_SCORE, MIN_MOOD_SCORE};
pub use transcript::{format_transcript, TranscriptMessage, CLIENT_ROLE};
