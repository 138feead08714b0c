use super::model::Session;
use crate::error::{AppError, AppResult};
use crate::store::{from_document, Direction, DocumentStore, Filter, Query, SESSIONS};

/// Fetch one session, `NotFound` if it does not exist
pub async fn fetch_session(store: &dyn DocumentStore, session_id: &str) -> AppResult<Session> {
    let data = store
        .get(SESSIONS, session_id)
        .await
        .map_err(|e| AppError::external("store", e))?
        .ok_or_else(|| AppError::not_found("session", session_id))?;

    from_document(session_id, data).map_err(|e| AppError::external("store", e))
}

/// Fetch a session and check that `user_id` owns it
pub async fn fetch_owned_session(
    store: &dyn DocumentStore,
    session_id: &str,
    user_id: &str,
) -> AppResult<Session> {
    let session = fetch_session(store, session_id).await?;
    if session.user_id != user_id {
        return Err(AppError::unauthorized(user_id, session_id));
    }
    Ok(session)
}

/// Run a session query and decode every hit
pub async fn query_sessions(store: &dyn DocumentStore, query: &Query) -> AppResult<Vec<Session>> {
    store
        .query(query)
        .await
        .map_err(|e| AppError::external("store", e))?
        .into_iter()
        .map(|doc| from_document(&doc.id, doc.data).map_err(|e| AppError::external("store", e)))
        .collect()
}

/// Sessions owned by `user_id`, newest first
pub fn user_sessions_query(user_id: &str) -> Query {
    Query::collection(SESSIONS)
        .filter(Filter::eq("userId", user_id))
        .order_by("createdAt", Direction::Descending)
}

/// Finalized sessions of everyone except `user_id`, newest first
pub fn latest_sessions_query(user_id: &str, limit: usize) -> Query {
    Query::collection(SESSIONS)
        .filter(Filter::eq("finalized", true))
        .filter(Filter::not_eq("userId", user_id))
        .order_by("createdAt", Direction::Descending)
        .limit(limit)
}
