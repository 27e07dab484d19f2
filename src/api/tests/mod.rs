use super::*;
use crate::pipeline::test_helpers::{TestKit, create_test_tracker};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

mod subdomains;
mod system;

/// Router over a tracker holding project `acme` with root domain `example.com`
async fn create_test_app(kit: &TestKit) -> (Router, Arc<Tracker>, tempfile::TempDir) {
    let (tracker, temp_dir) = create_test_tracker(kit, "acme", &["example.com"]).await;
    let tracker = Arc::new(tracker);
    let config = tracker.get_config();
    (create_router(tracker.clone(), config), tracker, temp_dir)
}

/// Send one request and decode the JSON response body (Null when empty)
async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

#[tokio::test]
async fn test_api_server_spawns() {
    let kit = TestKit::new(&[], &[]);
    let (tracker, _temp_dir) = create_test_tracker(&kit, "acme", &[]).await;
    let tracker = Arc::new(tracker);

    // Port 0 = OS assigns a free port
    let mut config = (*tracker.get_config()).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let tracker = tracker.clone();
        async move { start_api_server(tracker, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server should still be serving");
    api_handle.abort();
}

#[tokio::test]
async fn test_server_starts_and_responds_to_health() {
    let kit = TestKit::new(&[], &[]);
    let (_app, tracker, _temp_dir) = create_test_app(&kit).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server_handle = tokio::spawn({
        let tracker = tracker.clone();
        let config = tracker.get_config();
        async move {
            let app = create_router(tracker, config);
            axum::serve(listener, app).await.unwrap();
        }
    });

    let body: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");

    server_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let kit = TestKit::new(&[], &[]);
    let (_app, tracker, _temp_dir) = create_test_app(&kit).await;

    let mut config = (*tracker.get_config()).clone();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let app = create_router(tracker, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let kit = TestKit::new(&[], &[]);
    let (_app, tracker, _temp_dir) = create_test_app(&kit).await;

    let mut config = (*tracker.get_config()).clone();
    config.api.cors_enabled = false;
    let app = create_router(tracker, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let kit = TestKit::new(&[], &[]);
    let (app, _tracker, _temp_dir) = create_test_app(&kit).await;

    let (status, _) = send(&app, Method::GET, "/nowhere", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
