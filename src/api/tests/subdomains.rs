use super::*;
use crate::db::NewSubdomain;

async fn seed(tracker: &Tracker, hosts: &[&str]) {
    let subs: Vec<NewSubdomain> = hosts
        .iter()
        .map(|h| NewSubdomain {
            root_domain: "example.com".into(),
            subdomain: h.to_string(),
        })
        .collect();
    assert!(tracker.db.upsert_subdomains("acme", &subs).await.is_empty());
}

#[tokio::test]
async fn list_subdomains() {
    let kit = TestKit::new(&[], &[]);
    let (app, tracker, _temp_dir) = create_test_app(&kit).await;
    seed(&tracker, &["www.example.com", "api.example.com"]).await;

    let (status, body) = send(&app, Method::GET, "/subdomains/acme", None).await;

    assert_eq!(status, StatusCode::OK);
    let subs = body.as_array().unwrap();
    assert_eq!(subs.len(), 2);
    assert_eq!(subs[0]["subdomain"], "api.example.com");
    assert_eq!(subs[0]["root_domain"], "example.com");
    assert!(subs[0]["has_dns_from"].is_null());
    assert!(subs[0]["has_http_from"].is_null());
}

#[tokio::test]
async fn list_subdomains_after_timestamp() {
    let kit = TestKit::new(&[], &[]);
    let (app, tracker, _temp_dir) = create_test_app(&kit).await;
    seed(&tracker, &["old.example.com"]).await;

    tokio::time::sleep(Duration::from_millis(5)).await;
    let cutoff = chrono::Utc::now();
    tokio::time::sleep(Duration::from_millis(5)).await;
    seed(&tracker, &["new.example.com"]).await;

    let uri = format!(
        "/subdomains/acme?after={}",
        cutoff.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    );
    let (status, body) = send(&app, Method::GET, &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    let subs = body.as_array().unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0]["subdomain"], "new.example.com");
}

#[tokio::test]
async fn malformed_after_is_400() {
    let kit = TestKit::new(&[], &[]);
    let (app, _tracker, _temp_dir) = create_test_app(&kit).await;

    let (status, body) = send(&app, Method::GET, "/subdomains/acme?after=yesterday", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn list_subdomains_of_unknown_project_is_404() {
    let kit = TestKit::new(&[], &[]);
    let (app, _tracker, _temp_dir) = create_test_app(&kit).await;

    let (status, _) = send(&app, Method::GET, "/subdomains/globex", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
