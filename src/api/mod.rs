//! REST API server module
//!
//! Exposes projects, root domains and discovered subdomains, and lets a
//! caller trigger pipeline runs. Triggers answer `202 Accepted` as soon as
//! the run is scheduled; results arrive through notifications and the
//! `/events` stream.

use crate::{Config, Result, Tracker};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Path of the OpenAPI document loaded by the Swagger UI
pub const SWAGGER_DOC_PATH: &str = "/api-docs/openapi.json";

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Projects
/// - `GET /projects/:project` - Get a project
/// - `PUT /projects/new` - Create a project
///
/// ## Root Domains
/// - `GET /root_domains/:project` - List a project's root domains
/// - `PUT /root_domains/new` - Add root domains to a project
///
/// ## Subdomains
/// - `GET /subdomains/:project` - List subdomains (optionally `?after=<RFC3339>`)
///
/// ## Actions
/// - `POST /actions/check_new_subs` - Enumerate, then DNS and HTTP probe
/// - `POST /actions/dns_probe` - DNS probe only
/// - `POST /actions/http_probe` - HTTP probe only
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /api-docs/openapi.json` - Document behind the Swagger UI (if enabled)
/// - `GET /events` - Server-sent events stream
pub fn create_router(tracker: Arc<Tracker>, config: Arc<Config>) -> Router {
    let state = AppState::new(tracker, config.clone());

    let router = Router::new()
        // Projects
        .route("/projects/new", put(routes::new_project))
        .route("/projects/:project", get(routes::get_project))
        // Root Domains
        .route("/root_domains/new", put(routes::add_root_domains))
        .route("/root_domains/:project", get(routes::list_root_domains))
        // Subdomains
        .route("/subdomains/:project", get(routes::list_subdomains))
        // Actions
        .route("/actions/check_new_subs", post(routes::check_new_subs))
        .route("/actions/dns_probe", post(routes::dns_probe))
        .route("/actions/http_probe", post(routes::http_probe))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream));

    // Swagger UI carries its own copy of the document; /openapi.json is taken
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url(SWAGGER_DOC_PATH, ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` or an empty list allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the listener fails or the task is aborted.
///
/// # Example
///
/// ```no_run
/// use subnode::{Config, Tracker};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let tracker = Arc::new(Tracker::new((*config).clone()).await?);
///
/// subnode::api::start_api_server(tracker, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(tracker: Arc<Tracker>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(tracker, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
