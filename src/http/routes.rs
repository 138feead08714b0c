use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route("/sessions/latest", get(handlers::latest_sessions))
        .route("/sessions/:session_id", get(handlers::get_session))
        // Insights
        .route(
            "/sessions/:session_id/insight",
            get(handlers::get_insight).post(handlers::create_insight),
        )
        // Voice call control
        .route("/sessions/:session_id/call", get(handlers::get_call))
        .route(
            "/sessions/:session_id/call/start",
            post(handlers::start_call),
        )
        .route(
            "/sessions/:session_id/call/events",
            post(handlers::relay_call_event),
        )
        .route("/sessions/:session_id/call/mute", post(handlers::mute_call))
        .route("/sessions/:session_id/call/stop", post(handlers::stop_call))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
