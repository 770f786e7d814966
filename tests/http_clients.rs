//! HTTP clients against an in-process stub of both backends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use studysync_lib::analysis::{
    EmotionClient, FocusClient, HttpEmotionClient, HttpFocusClient, Outcome,
};
use studysync_lib::api::{ApiError, HttpSessionApi, SessionApi};
use studysync_lib::capture::Sample;
use studysync_lib::models::{Emotion, SessionId};

const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<String>>>);

impl Seen {
    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

async fn start_session() -> Json<Value> {
    Json(json!({ "session_id": 42, "start_time": "2024-05-01T10:00:00.123456" }))
}

async fn end_session(Path(id): Path<String>) -> Response {
    if id != "42" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Session not found" })),
        )
            .into_response();
    }
    Json(json!({
        "message": "Session ended successfully",
        "session_summary": {
            "total_duration": 25.0,
            "average_attention_score": 55.0,
            "recommended_break_duration": 10
        }
    }))
    .into_response()
}

async fn sessions() -> Json<Value> {
    Json(json!([
        { "id": 2, "start_time": "2024-05-02T09:00:00", "end_time": null },
        {
            "id": 1,
            "start_time": "2024-05-01T10:00:00",
            "end_time": "2024-05-01T10:25:00",
            "total_duration": 25.0,
            "average_attention_score": 35.0,
            "recommended_break_duration": 15
        }
    ]))
}

async fn analyze_focus(
    State(seen): State<Seen>,
    Query(query): Query<HashMap<String, String>>,
    mut multipart: Multipart,
) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap();
        seen.push(format!("{name}:{file_name}:{content_type}:{}", bytes.len()));
    }
    seen.push(format!(
        "session_id={}",
        query.get("session_id").cloned().unwrap_or_default()
    ));
    Json(json!({ "focused": true, "study_state": "focused", "attention_score": 81.5 }))
}

async fn predict_emotion(Json(body): Json<Value>) -> Response {
    let image = body["image"].as_str().unwrap_or_default();
    if !image.starts_with("data:image/jpeg;base64,") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid image" }))).into_response();
    }
    Json(json!({
        "emotion": "Happy",
        "confidence": 0.91,
        "probabilities": { "Happy": 0.91, "Neutral": 0.09 }
    }))
    .into_response()
}

async fn slow_sessions() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!([]))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn spawn_stub() -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/start_session/", post(start_session))
        .route("/end_session/:id", post(end_session))
        .route("/sessions/", get(sessions))
        .route("/slow/sessions/", get(slow_sessions))
        .route("/analyze_focus/", post(analyze_focus))
        .route("/predict_emotion", post(predict_emotion))
        .route("/health", get(health))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/"), seen)
}

fn sample() -> Sample {
    Sample::new(Utc::now(), vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9])
}

#[tokio::test]
async fn session_lifecycle_round_trip() {
    let (base, _) = spawn_stub().await;
    let api = HttpSessionApi::new(&base, TIMEOUT);

    let started = api.start_session().await.unwrap();
    assert_eq!(started.id, SessionId::new("42"));
    assert!(started.start_time.is_some());

    let summary = api.end_session(&started.id).await.unwrap();
    assert_eq!(summary.total_duration, Some(25.0));
    assert_eq!(summary.average_attention_score, Some(55.0));
    assert_eq!(summary.recommended_break_duration, Some(10));
}

#[tokio::test]
async fn unknown_session_surfaces_server_detail() {
    let (base, _) = spawn_stub().await;
    let api = HttpSessionApi::new(&base, TIMEOUT);

    let err = api.end_session(&SessionId::new("99")).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 404,
            detail: "Session not found".into()
        }
    );
}

#[tokio::test]
async fn session_listing_keeps_server_order() {
    let (base, _) = spawn_stub().await;
    let api = HttpSessionApi::new(&base, TIMEOUT);

    let rows = api.list_sessions().await.unwrap();
    let ids: Vec<_> = rows.iter().map(|row| row.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "1"]);
    assert!(rows[0].ended_at.is_none());
    assert_eq!(rows[1].recommended_break_duration, Some(15));
}

#[tokio::test]
async fn focus_upload_uses_file_field_and_session_query() {
    let (base, seen) = spawn_stub().await;
    let client = HttpFocusClient::new(&base, TIMEOUT);

    let outcome = client.analyze(&sample(), &SessionId::new("42")).await;
    let reading = outcome.success().expect("focus call succeeded");
    assert!(reading.focused);
    assert_eq!(reading.attention_score, Some(81.5));
    assert_eq!(reading.study_state.as_deref(), Some("focused"));

    assert_eq!(
        seen.all(),
        vec![
            "file:webcam_capture.jpeg:image/jpeg:8".to_string(),
            "session_id=42".to_string(),
        ]
    );
}

#[tokio::test]
async fn emotion_request_sends_data_uri() {
    let (base, _) = spawn_stub().await;
    let client = HttpEmotionClient::new(&base, TIMEOUT);

    let reading = match client.classify(&sample()).await {
        Outcome::Success(reading) => reading,
        Outcome::Failure(reason) => panic!("emotion call failed: {reason}"),
    };
    assert_eq!(reading.emotion, Some(Emotion::Happy));
    assert_eq!(reading.confidence, 0.91);
    assert_eq!(reading.probabilities.len(), 2);
    assert!(client.health().await.is_ok());
}

#[tokio::test]
async fn unreachable_backend_is_a_failure_not_a_panic() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let base = format!("http://{addr}");

    let focus = HttpFocusClient::new(&base, Duration::from_secs(1));
    assert!(!focus.analyze(&sample(), &SessionId::new("42")).await.is_success());

    let api = HttpSessionApi::new(&base, Duration::from_secs(1));
    assert!(matches!(
        api.start_session().await,
        Err(ApiError::Transport(_))
    ));
}

#[tokio::test]
async fn configured_timeout_bounds_each_request() {
    let (base, _) = spawn_stub().await;
    let api = HttpSessionApi::new(&format!("{base}slow"), Duration::from_millis(200));

    let started = std::time::Instant::now();
    let result = api.list_sessions().await;
    assert!(matches!(result, Err(ApiError::Transport(_))), "{result:?}");
    assert!(started.elapsed() < Duration::from_secs(3));
}
