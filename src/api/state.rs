//! Application state for the API server

use crate::{Config, Tracker};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The tracker every handler delegates to
    pub tracker: Arc<Tracker>,

    /// Configuration the server was started with
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(tracker: Arc<Tracker>, config: Arc<Config>) -> Self {
        Self { tracker, config }
    }
}
