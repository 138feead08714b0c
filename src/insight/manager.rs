use super::model::{Insight, InsightDraft};
use super::transcript::{format_transcript, TranscriptMessage};
use crate::error::{AppError, AppResult};
use crate::generation::{generate_object, prompts, StructuredGenerator};
use crate::session::repository::fetch_owned_session;
use crate::store::{
    from_document, timestamp, to_document, ClaimConflict, Document, DocumentStore, Filter, Query,
    Write, INSIGHTS, SESSIONS,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Input of `InsightManager::create_insight`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInsight {
    pub session_id: String,
    pub user_id: String,
    pub transcript: Vec<TranscriptMessage>,

    /// Overwrite this insight document instead of resolving one
    #[serde(default)]
    pub insight_id: Option<String>,
}

/// Turns finished conversations into persisted insights
#[derive(Clone)]
pub struct InsightManager {
    store: Arc<dyn DocumentStore>,
    generator: Arc<dyn StructuredGenerator>,
}

impl InsightManager {
    pub fn new(store: Arc<dyn DocumentStore>, generator: Arc<dyn StructuredGenerator>) -> Self {
        Self { store, generator }
    }

    /// Analyze a transcript, persist the insight and finalize the session.
    ///
    /// The insight write and the session's `finalized` flag are committed in
    /// one batch, together with a claim on the insight's `sessionId` so a
    /// session never ends up with two insight documents. Without an explicit
    /// `insight_id` an existing insight of the session is overwritten; an
    /// explicit id must name that insight, or a new one if none exists.
    pub async fn create_insight(&self, params: CreateInsight) -> AppResult<Insight> {
        let CreateInsight {
            session_id,
            user_id,
            transcript,
            insight_id,
        } = params;

        if transcript.is_empty() {
            warn!("No conversation recorded for session {}", session_id);
            return Err(AppError::validation("no conversation recorded"));
        }

        let session = fetch_owned_session(self.store.as_ref(), &session_id, &user_id).await?;

        info!(
            "Generating insight for session {} from {} utterances",
            session.id,
            transcript.len()
        );

        let formatted = format_transcript(&transcript);
        let request = prompts::insight_request(&formatted);
        let draft: InsightDraft = generate_object(self.generator.as_ref(), &request).await?;

        let insight_id = self
            .resolve_insight_id(&session.id, insight_id.filter(|id| !id.trim().is_empty()))
            .await?;

        let insight = draft
            .into_insight(insight_id, session.id.clone(), timestamp::now())
            .map_err(|reason| {
                error!("Rejected generated insight for session {}: {}", session.id, reason);
                AppError::ExternalService {
                    service: "generation",
                    message: reason,
                }
            })?;

        let data = to_document(&insight).map_err(|e| AppError::external("store", e))?;
        let mut finalize = Document::new();
        finalize.insert("finalized".to_string(), Value::Bool(true));

        self.store
            .commit(vec![
                Write::Claim {
                    collection: INSIGHTS.to_string(),
                    id: insight.id.clone(),
                    field: "sessionId".to_string(),
                    value: Value::String(session.id.clone()),
                },
                Write::Set {
                    collection: INSIGHTS.to_string(),
                    id: insight.id.clone(),
                    data,
                },
                Write::Update {
                    collection: SESSIONS.to_string(),
                    id: session.id.clone(),
                    fields: finalize,
                },
            ])
            .await
            .map_err(|e| {
                if let Some(conflict) = e.downcast_ref::<ClaimConflict>() {
                    warn!(
                        "Insight {} for session {} lost to {}",
                        insight.id, session.id, conflict.holder
                    );
                    return AppError::validation(format!(
                        "insight {} conflicts with stored insight {}",
                        insight.id, conflict.holder
                    ));
                }
                error!("Failed to persist insight for session {}: {:#}", session.id, e);
                AppError::external("store", e)
            })?;

        info!(
            "Insight {} stored for session {} (moodScore={})",
            insight.id, session.id, insight.mood_score
        );

        Ok(insight)
    }

    /// The insight of a session, `None` if it has not been produced yet
    pub async fn get_insight_by_session_id(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Insight>> {
        fetch_owned_session(self.store.as_ref(), session_id, user_id).await?;
        self.find_for_session(session_id).await
    }

    async fn find_for_session(&self, session_id: &str) -> AppResult<Option<Insight>> {
        let query = Query::collection(INSIGHTS)
            .filter(Filter::eq("sessionId", session_id))
            .limit(1);

        let hit = self
            .store
            .query(&query)
            .await
            .map_err(|e| AppError::external("store", e))?
            .into_iter()
            .next();

        hit.map(|doc| from_document(&doc.id, doc.data).map_err(|e| AppError::external("store", e)))
            .transpose()
    }

    /// Pick the document id the insight is written to
    async fn resolve_insight_id(
        &self,
        session_id: &str,
        requested: Option<String>,
    ) -> AppResult<String> {
        match requested {
            Some(id) => {
                let existing = self
                    .store
                    .get(INSIGHTS, &id)
                    .await
                    .map_err(|e| AppError::external("store", e))?;

                let owner = existing
                    .as_ref()
                    .and_then(|doc| doc.get("sessionId"))
                    .and_then(Value::as_str);
                if let Some(owner) = owner {
                    if owner != session_id {
                        return Err(AppError::validation(format!(
                            "insight {} belongs to another session",
                            id
                        )));
                    }
                }

                if let Some(existing) = self.find_for_session(session_id).await? {
                    if existing.id != id {
                        warn!(
                            "Refusing insight {} for session {}: it already has {}",
                            id, session_id, existing.id
                        );
                        return Err(AppError::validation(format!(
                            "session {} already has insight {}",
                            session_id, existing.id
                        )));
                    }
                }
                Ok(id)
            }
            None => match self.find_for_session(session_id).await? {
                Some(existing) => {
                    info!(
                        "Session {} already has insight {}; overwriting it",
                        session_id, existing.id
                    );
                    Ok(existing.id)
                }
                None => Ok(self.store.new_id()),
            },
        }
    }
}
