use super::model::{NewSession, Session, SessionPlan};
use super::repository;
use crate::error::{AppError, AppResult};
use crate::generation::{generate_object, prompts, StructuredGenerator};
use crate::store::{timestamp, to_document, DocumentStore, SESSIONS};
use std::sync::Arc;
use tracing::{error, info};

/// Default page size for `latest_sessions`
pub const DEFAULT_LATEST_LIMIT: usize = 10;

/// Creates session records and serves session lookups
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn DocumentStore>,
    generator: Arc<dyn StructuredGenerator>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn DocumentStore>, generator: Arc<dyn StructuredGenerator>) -> Self {
        Self { store, generator }
    }

    /// Generate prompts/tags for the session and persist it.
    ///
    /// Nothing is written unless generation succeeds.
    pub async fn create_session(&self, user_id: &str, details: NewSession) -> AppResult<Session> {
        if user_id.trim().is_empty() {
            return Err(AppError::validation("userId is required"));
        }
        details.validate().map_err(AppError::Validation)?;

        info!(
            "Creating session for user {} (focus={}, approach={}, duration={}m)",
            user_id, details.focus_area, details.therapy_approach, details.duration
        );

        let request = prompts::session_plan_request(&details);
        let plan: SessionPlan = generate_object(self.generator.as_ref(), &request).await?;
        let plan = plan.normalized().map_err(|reason| {
            error!("Rejected generated session plan: {}", reason);
            AppError::ExternalService {
                service: "generation",
                message: reason,
            }
        })?;

        let session = Session {
            id: self.store.new_id(),
            user_id: user_id.to_string(),
            focus_area: details.focus_area,
            session_type: details.session_type,
            therapy_approach: details.therapy_approach,
            mood: details.mood,
            duration: details.duration,
            prompts: plan.prompts,
            tags: plan.tags,
            finalized: false,
            created_at: timestamp::now(),
        };

        let data = to_document(&session).map_err(|e| AppError::external("store", e))?;
        self.store
            .set(SESSIONS, &session.id, data)
            .await
            .map_err(|e| {
                error!("Failed to persist session {}: {:#}", session.id, e);
                AppError::external("store", e)
            })?;

        info!(
            "Session {} created with {} prompts",
            session.id,
            session.prompts.len()
        );

        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> AppResult<Session> {
        repository::fetch_session(self.store.as_ref(), session_id).await
    }

    /// Fetch a session on behalf of `user_id`, rejecting other owners
    pub async fn get_owned_session(&self, session_id: &str, user_id: &str) -> AppResult<Session> {
        repository::fetch_owned_session(self.store.as_ref(), session_id, user_id).await
    }

    /// All sessions of a user, newest first
    pub async fn sessions_for_user(&self, user_id: &str) -> AppResult<Vec<Session>> {
        let query = repository::user_sessions_query(user_id);
        repository::query_sessions(self.store.as_ref(), &query).await
    }

    /// Newest finalized sessions of other users
    pub async fn latest_sessions(&self, user_id: &str, limit: usize) -> AppResult<Vec<Session>> {
        let query = repository::latest_sessions_query(user_id, limit);
        repository::query_sessions(self.store.as_ref(), &query).await
    }
}
