use super::identity::UserId;
use super::state::{ActiveCall, AppState};
use crate::call::{CallEvent, CallSession, CallSnapshot, RelayVoiceClient, VoiceClient};
use crate::error::AppError;
use crate::insight::{CreateInsight, Insight, TranscriptMessage};
use crate::session::{NewSession, Session, DEFAULT_LATEST_LIMIT};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// How long `stop` waits for the post-call work before answering
const STOP_WAIT: Duration = Duration::from_secs(120);

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub success: bool,
    pub session_id: String,
    pub session: Session,
}

#[derive(Debug, Deserialize)]
pub struct LatestSessionsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInsightRequest {
    pub transcript: Vec<TranscriptMessage>,

    /// Existing insight document to overwrite
    #[serde(default)]
    pub insight_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCallRequest {
    #[serde(default)]
    pub insight_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MuteRequest {
    pub muted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
/// Create a session with generated prompts
pub async fn create_session(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(req): Json<NewSession>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let session = state.sessions.create_session(&user_id, req).await?;

    Ok(Json(CreateSessionResponse {
        success: true,
        session_id: session.id.clone(),
        session,
    }))
}

/// GET /sessions
/// Sessions of the calling user, newest first
pub async fn list_sessions(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<Vec<Session>>, AppError> {
    Ok(Json(state.sessions.sessions_for_user(&user_id).await?))
}

/// GET /sessions/latest?limit=N
/// Latest finalized sessions of other users
pub async fn latest_sessions(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Query(query): Query<LatestSessionsQuery>,
) -> Result<Json<Vec<Session>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LATEST_LIMIT);
    Ok(Json(state.sessions.latest_sessions(&user_id, limit).await?))
}

/// GET /sessions/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, AppError> {
    Ok(Json(
        state.sessions.get_owned_session(&session_id, &user_id).await?,
    ))
}

/// POST /sessions/:session_id/insight
/// Analyze a transcript and finalize the session
pub async fn create_insight(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<String>,
    Json(req): Json<CreateInsightRequest>,
) -> Result<Json<Insight>, AppError> {
    let insight = state
        .insights
        .create_insight(CreateInsight {
            session_id,
            user_id,
            transcript: req.transcript,
            insight_id: req.insight_id,
        })
        .await?;

    Ok(Json(insight))
}

/// GET /sessions/:session_id/insight
/// Insight of a session, `null` if not produced yet
pub async fn get_insight(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<String>,
) -> Result<Json<Option<Insight>>, AppError> {
    Ok(Json(
        state
            .insights
            .get_insight_by_session_id(&session_id, &user_id)
            .await?,
    ))
}

/// POST /sessions/:session_id/call/start
/// Start a voice call for a session
pub async fn start_call(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<String>,
    Json(req): Json<StartCallRequest>,
) -> Result<Json<CallSnapshot>, AppError> {
    state
        .sessions
        .get_owned_session(&session_id, &user_id)
        .await?;

    let mut calls = state.calls.write().await;

    if let Some(existing) = calls.get(&session_id) {
        if existing.call.is_active() {
            warn!("Session {} already has an active call", session_id);
            return Err(AppError::validation(format!(
                "session {} already has an active call",
                session_id
            )));
        }
    }

    let relay = Arc::new(RelayVoiceClient::new(state.voice.api_token.clone()));
    let voice: Arc<dyn VoiceClient> = relay.clone();
    let call = Arc::new(CallSession::new(
        session_id.clone(),
        user_id,
        req.insight_id,
        voice,
        state.insights.clone(),
    ));

    call.start(&state.voice).await?;

    let snapshot = call.snapshot().await;
    calls.insert(session_id.clone(), ActiveCall { call, relay });

    info!("Call started for session {}", session_id);
    Ok(Json(snapshot))
}

/// POST /sessions/:session_id/call/events
/// Relay one voice SDK event into the running call
pub async fn relay_call_event(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<String>,
    Json(event): Json<CallEvent>,
) -> Result<StatusCode, AppError> {
    let active = find_call(&state, &session_id, &user_id).await?;

    active.relay.relay(event).await.map_err(|e| {
        warn!("Dropped call event for session {}: {:#}", session_id, e);
        AppError::validation(format!("{:#}", e))
    })?;

    Ok(StatusCode::ACCEPTED)
}

/// POST /sessions/:session_id/call/mute
pub async fn mute_call(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<String>,
    Json(req): Json<MuteRequest>,
) -> Result<Json<CallSnapshot>, AppError> {
    let active = find_call(&state, &session_id, &user_id).await?;
    active.call.set_muted(req.muted)?;
    Ok(Json(active.call.snapshot().await))
}

/// POST /sessions/:session_id/call/stop
/// End the call and wait for its insight
pub async fn stop_call(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<String>,
) -> Result<Json<CallSnapshot>, AppError> {
    let active = find_call(&state, &session_id, &user_id).await?;

    active.call.stop();

    if tokio::time::timeout(STOP_WAIT, active.call.wait_for_outcome())
        .await
        .is_err()
    {
        error!(
            "Post-call work for session {} still running after {:?}",
            session_id, STOP_WAIT
        );
    }

    Ok(Json(active.call.snapshot().await))
}

/// GET /sessions/:session_id/call
/// Status, transcript so far and outcome of the session's call
pub async fn get_call(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(session_id): Path<String>,
) -> Result<Json<CallSnapshot>, AppError> {
    let active = find_call(&state, &session_id, &user_id).await?;
    Ok(Json(active.call.snapshot().await))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn find_call(state: &AppState, session_id: &str, user_id: &str) -> Result<ActiveCall, AppError> {
    let calls = state.calls.read().await;
    let active = calls
        .get(session_id)
        .cloned()
        .ok_or_else(|| AppError::not_found("call", session_id))?;

    if active.call.user_id() != user_id {
        return Err(AppError::unauthorized(user_id, session_id));
    }
    Ok(active)
}
