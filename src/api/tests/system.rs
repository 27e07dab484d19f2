use super::*;

#[tokio::test]
async fn test_health_endpoint() {
    let kit = TestKit::new(&[], &[]);
    let (app, _tracker, _temp_dir) = create_test_app(&kit).await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let kit = TestKit::new(&[], &[]);
    let (app, _tracker, _temp_dir) = create_test_app(&kit).await;

    let (status, body) = send(&app, Method::GET, "/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "subnode REST API");
    assert!(body["paths"]["/actions/dns_probe"].is_object());
}

#[tokio::test]
async fn test_sse_event_stream() {
    let kit = TestKit::new(&[], &[]);
    let (app, tracker, _temp_dir) = create_test_app(&kit).await;

    let request = Request::builder()
        .uri("/events")
        .header("Accept", "text/event-stream")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(
        content_type.contains("text/event-stream"),
        "Content-Type should be text/event-stream, got: {}",
        content_type
    );

    // The stream subscribed when the handler ran; an emitted event is framed with its kind
    tracker.emit_event(crate::types::Event::Shutdown);

    let mut body = response.into_body().into_data_stream();
    let chunk = tokio::time::timeout(Duration::from_secs(2), tokio_stream::StreamExt::next(&mut body))
        .await
        .expect("an event should be streamed")
        .unwrap()
        .unwrap();
    let text = String::from_utf8(chunk.to_vec()).unwrap();

    assert!(text.contains("event: shutdown"), "got: {text}");
    assert!(text.contains(r#""type":"shutdown""#), "got: {text}");
}

#[tokio::test]
async fn test_default_config_router_serves_both_documents() {
    let kit = TestKit::new(&[], &[]);
    let (_app, tracker, _temp_dir) = create_test_app(&kit).await;

    let config = crate::Config::default();
    assert!(config.api.swagger_ui);
    let app = create_router(tracker, Arc::new(config));

    let (status, body) = send(&app, Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "subnode REST API");

    let (status, body) = send(&app, Method::GET, SWAGGER_DOC_PATH, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/subdomains/{project}"].is_object());
}

#[tokio::test]
async fn test_swagger_disabled_drops_its_document() {
    let kit = TestKit::new(&[], &[]);
    let (_app, tracker, _temp_dir) = create_test_app(&kit).await;

    let mut config = crate::Config::default();
    config.api.swagger_ui = false;
    let app = create_router(tracker, Arc::new(config));

    let (status, _) = send(&app, Method::GET, SWAGGER_DOC_PATH, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
}
