use crate::state::{AppState, Clock, StreamEvent};
use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{
        sse::{Event, Sse},
        Json,
    },
    routing::{get, post},
    Router,
};
use serde::Serialize;
use sim_core::Command;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[cfg(test)]
pub fn make_router(state: AppState) -> Router {
    make_router_with_cors(state, HeaderValue::from_static("http://localhost:5173"))
}

pub fn make_router_with_cors(state: AppState, cors_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/meta", get(meta_handler))
        .route("/api/v1/content", get(content_handler))
        .route("/api/v1/snapshot", get(snapshot_handler))
        .route("/api/v1/metrics", get(metrics_handler))
        .route("/api/v1/stream", get(stream_handler))
        .route("/api/v1/command", post(command_handler))
        .route("/api/v1/pause", post(pause_handler))
        .route("/api/v1/resume", post(resume_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
pub struct Meta {
    #[serde(flatten)]
    clock: Clock,
    seed: u64,
    content_version: String,
    frame_ms: u64,
    autopilot: bool,
    paused: bool,
}

pub async fn meta_handler(State(app_state): State<AppState>) -> Json<Meta> {
    let sim = app_state.sim.lock();
    Json(Meta {
        clock: sim.clock(),
        seed: sim.game_state.meta.seed,
        content_version: sim.game_state.meta.content_version.clone(),
        frame_ms: app_state.frame_ms,
        autopilot: sim.autopilot.is_some(),
        paused: app_state.paused.load(Ordering::Relaxed),
    })
}

fn json_body(
    result: serde_json::Result<String>,
    what: &str,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    match result {
        Ok(json) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            json,
        ),
        Err(err) => {
            tracing::error!("{what} serialization failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                r#"{"error":"serialization failed"}"#.to_string(),
            )
        }
    }
}

pub async fn snapshot_handler(
    State(app_state): State<AppState>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let result = serde_json::to_string(&app_state.sim.lock().game_state);
    json_body(result, "snapshot")
}

pub async fn content_handler(
    State(app_state): State<AppState>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let result = serde_json::to_string(&app_state.sim.lock().content);
    json_body(result, "content")
}

pub async fn metrics_handler(
    State(app_state): State<AppState>,
) -> Json<VecDeque<sim_core::MetricsSnapshot>> {
    let sim = app_state.sim.lock();
    Json(sim.metrics_history.clone())
}

/// Queues a command for the next frame. Malformed bodies are rejected by the
/// `Json` extractor; commands the game state cannot honor are no-ops.
pub async fn command_handler(
    State(app_state): State<AppState>,
    Json(command): Json<Command>,
) -> (StatusCode, Json<serde_json::Value>) {
    let mut sim = app_state.sim.lock();
    tracing::debug!(?command, "command queued");
    sim.player.push(command);
    let queued = sim.player.len();
    drop(sim);
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "queued": queued })),
    )
}

pub async fn pause_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    app_state.paused.store(true, Ordering::Relaxed);
    Json(serde_json::json!({"paused": true}))
}

pub async fn resume_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    app_state.paused.store(false, Ordering::Relaxed);
    Json(serde_json::json!({"paused": false}))
}

/// Drains buffered events into one `events` message, if there are any.
fn take_batch(pending: &mut Vec<StreamEvent>) -> Option<Event> {
    if pending.is_empty() {
        return None;
    }
    let data = serde_json::to_string(&*pending).unwrap_or_default();
    pending.clear();
    Some(Event::default().event("events").data(data))
}

/// Batches engine events every 50 ms and sends the clock once a second.
pub async fn stream_handler(
    State(app_state): State<AppState>,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let mut rx = app_state.event_tx.subscribe();
    let sim = app_state.sim.clone();

    let stream = async_stream::stream! {
        let mut heartbeat = tokio::time::interval(Duration::from_secs(1));
        let mut flush = tokio::time::interval(Duration::from_millis(50));
        heartbeat.tick().await;
        flush.tick().await;
        let mut pending: Vec<StreamEvent> = Vec::new();
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(batch) => pending.extend(batch),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "stream subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = flush.tick() => {
                    if let Some(message) = take_batch(&mut pending) {
                        yield Ok(message);
                    }
                }
                _ = heartbeat.tick() => {
                    let clock = sim.lock().clock();
                    let data = serde_json::to_string(&clock).unwrap_or_default();
                    yield Ok(Event::default().event("heartbeat").data(data));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::make_test_state;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_meta_contains_tick_and_flags() {
        let app = make_router(make_test_state(true));
        let response = app.oneshot(get_request("/api/v1/meta")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["tick"], 0);
        assert_eq!(json["elapsed_ms"], 0);
        assert_eq!(json["autopilot"], true);
        assert_eq!(json["paused"], false);
    }

    #[test]
    fn test_take_batch_drains_pending() {
        let mut pending = Vec::new();
        assert!(take_batch(&mut pending).is_none());

        let app = make_test_state(false);
        let mut sim = app.sim.lock();
        sim.player.push(Command::SendIdleShipsMining { count: None });
        pending.extend(crate::tick_loop::advance_frame(&mut sim, 100));
        assert!(!pending.is_empty());

        assert!(take_batch(&mut pending).is_some());
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_is_game_state() {
        let app = make_router(make_test_state(false));
        let response = app.oneshot(get_request("/api/v1/snapshot")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["fleet"]["idle"], 1);
        assert!(json["market"]["prices"]["ferrox"].is_object());
    }

    #[tokio::test]
    async fn test_content_lists_catalog() {
        let app = make_router(make_test_state(false));
        let response = app.oneshot(get_request("/api/v1/content")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["minerals"].as_array().map(Vec::len), Some(8));
    }

    #[tokio::test]
    async fn test_metrics_starts_empty() {
        let app = make_router(make_test_state(false));
        let response = app.oneshot(get_request("/api/v1/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_command_is_queued() {
        let state = make_test_state(false);
        let app = make_router(state.clone());
        let response = app
            .oneshot(post_json(
                "/api/v1/command",
                r#"{"SendIdleShipsMining":{"count":1}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(response).await["queued"], 1);
        assert_eq!(state.sim.lock().player.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_command_is_rejected() {
        let state = make_test_state(false);
        let app = make_router(state.clone());
        let response = app
            .oneshot(post_json("/api/v1/command", r#"{"LaunchNukes":{}}"#))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert!(state.sim.lock().player.is_empty());
    }

    #[tokio::test]
    async fn test_pause_and_resume_toggle_flag() {
        let state = make_test_state(false);

        let response = make_router(state.clone())
            .oneshot(post_json("/api/v1/pause", ""))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["paused"], true);
        assert!(state.paused.load(Ordering::Relaxed));

        make_router(state.clone())
            .oneshot(post_json("/api/v1/resume", ""))
            .await
            .unwrap();
        assert!(!state.paused.load(Ordering::Relaxed));
    }
}
