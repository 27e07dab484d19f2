//! System handlers: health, OpenAPI, events.

use crate::api::AppState;
use crate::types::Event;
use axum::{
    Json,
    extract::State,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.tracker.is_shutting_down() {
        "shutting_down"
    } else {
        "ok"
    };

    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3.1 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// GET /events - Server-sent events stream
///
/// Each pipeline event is one SSE frame named after its kind. A subscriber
/// that falls behind gets a `lagged` frame with the number of dropped events.
#[utoipa::path(
    get,
    path = "/events",
    tag = "system",
    responses(
        (status = 200, description = "Pipeline events (text/event-stream)", content_type = "text/event-stream")
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let frames = BroadcastStream::new(state.tracker.subscribe()).filter_map(|received| {
        let frame = match received {
            Ok(event) => sse_frame(&event)?,
            Err(BroadcastStreamRecvError::Lagged(dropped)) => {
                tracing::warn!(dropped, "event subscriber fell behind");
                SseEvent::default()
                    .event("lagged")
                    .data(json!({ "dropped": dropped }).to_string())
            }
        };
        Some(Ok(frame))
    });

    Sse::new(frames).keep_alive(KeepAlive::default())
}

fn sse_frame(event: &Event) -> Option<SseEvent> {
    match serde_json::to_string(event) {
        Ok(data) => Some(SseEvent::default().event(event.kind()).data(data)),
        Err(e) => {
            tracing::warn!(kind = event.kind(), error = %e, "dropping unserializable event");
            None
        }
    }
}
