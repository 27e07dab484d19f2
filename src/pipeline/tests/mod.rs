use super::test_helpers::{RecordingNotifier, ScriptedProbe, TestKit, create_test_tracker};
use super::*;
use crate::db::NewSubdomain;
use crate::error::Error;
use crate::types::{Event, Stage};
use std::time::Duration;


/// Store `hosts` under `ex.com` without running an enumerator
async fn seed(tracker: &Tracker, project: &str, hosts: &[&str]) {
    let subs: Vec<NewSubdomain> = hosts
        .iter()
        .map(|h| NewSubdomain {
            root_domain: "ex.com".into(),
            subdomain: h.to_string(),
        })
        .collect();
    assert!(tracker.db.upsert_subdomains(project, &subs).await.is_empty());
}

/// Drain every event currently buffered
fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
