// Integration tests for the HTTP API
//
// Requests are driven through the router without binding a socket.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{insight_output, session_plan, voice_config, ScriptedGenerator};
use serde_json::{json, Value};
use std::sync::Arc;
use therapy_sessions::config::VoiceConfig;
use therapy_sessions::http::USER_ID_HEADER;
use therapy_sessions::{create_router, AppState, MemoryStore};
use tower::ServiceExt;

fn state_with(generator: &Arc<ScriptedGenerator>, voice: VoiceConfig) -> AppState {
    AppState::new(Arc::new(MemoryStore::new()), generator.clone(), voice)
}

async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

fn session_body() -> Value {
    json!({
        "focusArea": "Anxiety Management",
        "sessionType": "First Session",
        "therapyApproach": "CBT",
        "mood": "anxious",
        "duration": 30
    })
}

async fn create_session(state: &AppState, generator: &ScriptedGenerator, user: &str) -> String {
    generator.push_ok(session_plan(5, &["anxiety"]));
    let (status, body) = send(state, "POST", "/sessions", Some(user), Some(session_body())).await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    body["sessionId"].as_str().unwrap().to_string()
}

fn final_transcript(role: &str, text: &str) -> Value {
    json!({
        "event": "message",
        "data": {
            "type": "transcript",
            "transcriptType": "final",
            "role": role,
            "transcript": text
        }
    })
}

#[tokio::test]
async fn test_health_check() {
    let state = state_with(&ScriptedGenerator::new(), voice_config());
    let (status, body) = send(&state, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    let generator = ScriptedGenerator::new();
    let state = state_with(&generator, voice_config());

    let (status, body) = send(&state, "POST", "/sessions", None, Some(session_body())).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_create_and_fetch_session() {
    let generator = ScriptedGenerator::new();
    let state = state_with(&generator, voice_config());

    generator.push_ok(session_plan(5, &["anxiety"]));
    let (status, body) = send(&state, "POST", "/sessions", Some("alice"), Some(session_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let session_id = body["sessionId"].as_str().unwrap().to_string();
    assert_eq!(body["session"]["id"], session_id.as_str());
    assert_eq!(body["session"]["prompts"].as_array().unwrap().len(), 5);
    assert_eq!(body["session"]["finalized"], false);

    let (status, body) = send(&state, "GET", &format!("/sessions/{}", session_id), Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["focusArea"], "Anxiety Management");

    let (status, body) = send(&state, "GET", "/sessions", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_session_errors_map_to_status_codes() {
    let generator = ScriptedGenerator::new();
    let state = state_with(&generator, voice_config());
    let session_id = create_session(&state, &generator, "alice").await;

    let (status, _) = send(&state, "GET", &format!("/sessions/{}", session_id), Some("mallory"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&state, "GET", "/sessions/missing", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let mut invalid = session_body();
    invalid["focusArea"] = json!("");
    let (status, _) = send(&state, "POST", "/sessions", Some("alice"), Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    generator.push_err("model overloaded");
    let (status, _) = send(&state, "POST", "/sessions", Some("alice"), Some(session_body())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_insight_flow_finalizes_session() {
    let generator = ScriptedGenerator::new();
    let state = state_with(&generator, voice_config());
    let session_id = create_session(&state, &generator, "alice").await;
    let insight_uri = format!("/sessions/{}/insight", session_id);

    let (status, body) = send(&state, "GET", &insight_uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&state, "POST", &insight_uri, Some("alice"), Some(json!({ "transcript": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    generator.push_ok(insight_output(62.0));
    let (status, body) = send(
        &state,
        "POST",
        &insight_uri,
        Some("alice"),
        Some(json!({
            "transcript": [
                { "role": "assistant", "content": "How was your week?" },
                { "role": "user", "content": "Stressful, but I managed." }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["moodScore"], 62);
    assert_eq!(body["sessionId"], session_id.as_str());

    let (_, session) = send(&state, "GET", &format!("/sessions/{}", session_id), Some("alice"), None).await;
    assert_eq!(session["finalized"], true);

    let (status, _) = send(&state, "GET", &insight_uri, Some("mallory"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, latest) = send(&state, "GET", "/sessions/latest?limit=5", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest.as_array().unwrap().len(), 1);

    let (_, own) = send(&state, "GET", "/sessions/latest", Some("alice"), None).await;
    assert!(own.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_relayed_call_produces_insight() {
    let generator = ScriptedGenerator::new();
    let state = state_with(&generator, voice_config());
    let session_id = create_session(&state, &generator, "alice").await;
    let call_uri = format!("/sessions/{}/call", session_id);

    let (status, body) = send(&state, "POST", &format!("{}/start", call_uri), Some("alice"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["status"], "connecting");

    let (status, _) = send(&state, "POST", &format!("{}/start", call_uri), Some("alice"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Only one active call per session");

    for event in [
        json!({ "event": "call-start" }),
        final_transcript("assistant", "What would you like to focus on?"),
        final_transcript("user", "Sleeping better."),
    ] {
        let (status, _) = send(&state, "POST", &format!("{}/events", call_uri), Some("alice"), Some(event)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    let (status, body) = send(&state, "POST", &format!("{}/mute", call_uri), Some("alice"), Some(json!({ "muted": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["muted"], true);

    let (status, _) = send(&state, "POST", &format!("{}/stop", call_uri), Some("mallory"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    generator.push_ok(insight_output(55.0));
    let (status, body) = send(&state, "POST", &format!("{}/stop", call_uri), Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["status"], "ended");
    assert_eq!(body["outcome"]["kind"], "insight_created");
    assert_eq!(body["outcome"]["insight"]["moodScore"], 55);

    let prompt = generator.last_request().unwrap().prompt;
    assert!(prompt.contains("Therapist: What would you like to focus on?\nClient: Sleeping better."));

    let (status, _) = send(&state, "POST", &format!("{}/events", call_uri), Some("alice"), Some(json!({ "event": "call-start" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Events after the call ended are refused");

    let (_, session) = send(&state, "GET", &format!("/sessions/{}", session_id), Some("alice"), None).await;
    assert_eq!(session["finalized"], true);
}

#[tokio::test]
async fn test_call_without_voice_config_fails() {
    let generator = ScriptedGenerator::new();
    let state = state_with(&generator, VoiceConfig::default());
    let session_id = create_session(&state, &generator, "alice").await;

    let (status, body) = send(
        &state,
        "POST",
        &format!("/sessions/{}/call/start", session_id),
        Some("alice"),
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);

    let (status, _) = send(&state, "GET", &format!("/sessions/{}/call", session_id), Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
