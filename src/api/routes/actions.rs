//! Pipeline trigger handlers.
//!
//! Each handler validates the project, schedules a detached run and answers
//! before any external tool has started.

use super::{ActionAccepted, ActionRequest};
use crate::api::AppState;
use crate::error::Result;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

fn accepted(action: &'static str, project: String) -> (StatusCode, Json<ActionAccepted>) {
    (
        StatusCode::ACCEPTED,
        Json(ActionAccepted {
            status: "accepted".to_string(),
            action: action.to_string(),
            project: project.trim().to_string(),
        }),
    )
}

/// POST /actions/check_new_subs - Enumerate, then DNS and HTTP probe
#[utoipa::path(
    post,
    path = "/actions/check_new_subs",
    tag = "actions",
    request_body = ActionRequest,
    responses(
        (status = 202, description = "Full pipeline scheduled", body = ActionAccepted),
        (status = 400, description = "Empty project name", body = crate::error::ApiError),
        (status = 404, description = "Project not found", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn check_new_subs(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> Result<impl IntoResponse> {
    state.tracker.check_new_subdomains(&request.project).await?;
    Ok(accepted("check_new_subs", request.project))
}

/// POST /actions/dns_probe - DNS probe the given or all stored subdomains
#[utoipa::path(
    post,
    path = "/actions/dns_probe",
    tag = "actions",
    request_body = ActionRequest,
    responses(
        (status = 202, description = "DNS probe scheduled", body = ActionAccepted),
        (status = 400, description = "Empty project name", body = crate::error::ApiError),
        (status = 404, description = "Project not found", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn dns_probe(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> Result<impl IntoResponse> {
    state
        .tracker
        .trigger_dns_probe(&request.project, request.subdomains)
        .await?;
    Ok(accepted("dns_probe", request.project))
}

/// POST /actions/http_probe - HTTP probe the given or all resolving subdomains
#[utoipa::path(
    post,
    path = "/actions/http_probe",
    tag = "actions",
    request_body = ActionRequest,
    responses(
        (status = 202, description = "HTTP probe scheduled", body = ActionAccepted),
        (status = 400, description = "Empty project name", body = crate::error::ApiError),
        (status = 404, description = "Project not found", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn http_probe(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> Result<impl IntoResponse> {
    state
        .tracker
        .trigger_http_probe(&request.project, request.subdomains)
        .await?;
    Ok(accepted("http_probe", request.project))
}
