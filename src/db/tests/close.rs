use super::{db_with_project, new_sub};
use std::collections::HashMap;

/// Verify that querying the database after closing the pool returns an error
/// rather than hanging or panicking.
#[tokio::test]
async fn test_get_project_after_pool_close_returns_error() {
    let (db, _file) = db_with_project("acme").await;

    assert!(db.get_project("acme").await.unwrap().is_some());

    // Close the pool (but keep the Database struct alive)
    db.pool().close().await;

    let result = db.get_project("acme").await;
    assert!(
        result.is_err(),
        "get_project after pool close should return an error, got: {:?}",
        result
    );
}

/// Bulk writers report failures per record instead of failing the call
#[tokio::test]
async fn test_bulk_writes_after_pool_close_return_write_errors() {
    let (db, _file) = db_with_project("acme").await;

    db.pool().close().await;

    let errors = db
        .upsert_subdomains(
            "acme",
            &[
                new_sub("ex.com", "www.ex.com"),
                new_sub("ex.com", "api.ex.com"),
            ],
        )
        .await;
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].key, "www.ex.com");

    let verdicts = HashMap::from([("www.ex.com".to_string(), true)]);
    let errors = db.ensure_dns_state("acme", &verdicts).await;
    assert_eq!(errors.len(), 1);
}
