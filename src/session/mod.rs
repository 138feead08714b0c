//! Therapy session lifecycle
//!
//! This module provides the `SessionManager` that handles:
//! - Validation of user-chosen session settings
//! - Generation of conversation prompts and tags
//! - Persistence of new session records
//! - Session lookups by id, by owner and across users

mod manager;
mod model;
pub(crate) mod repository;

pub use manager::{SessionManager, DEFAULT_LATEST_LIMIT};
pub use model::{NewSession, Session, SessionPlan};
