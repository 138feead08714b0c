//! HTTP API for the web front end
//!
//! This module provides a JSON API over the session workflow:
//! - POST /sessions - Create a session with generated prompts
//! - GET /sessions, /sessions/latest, /sessions/:id - Session lookups
//! - POST/GET /sessions/:id/insight - Create or fetch the session's insight
//! - POST /sessions/:id/call/{start,events,mute,stop} - Voice call control
//! - GET /sessions/:id/call - Call status and transcript
//! - GET /health - Health check

mod handlers;
mod identity;
mod routes;
mod state;

pub use handlers::{CreateSessionResponse, ErrorResponse};
pub use identity::{UserId, USER_ID_HEADER};
pub use routes::create_router;
pub use state::{ActiveCall, AppState};
