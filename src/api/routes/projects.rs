//! Project handlers.

use super::NewProjectRequest;
use crate::api::AppState;
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

/// GET /projects/:project - Get a project
#[utoipa::path(
    get,
    path = "/projects/{project}",
    tag = "projects",
    params(
        ("project" = String, Path, description = "Project name")
    ),
    responses(
        (status = 200, description = "Project details", body = crate::db::Project),
        (status = 404, description = "Project not found", body = crate::error::ApiError)
    )
)]
pub async fn get_project(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> Result<impl IntoResponse> {
    let project = state.tracker.get_project(&project).await?;
    Ok(Json(project))
}

/// PUT /projects/new - Create a project
#[utoipa::path(
    put,
    path = "/projects/new",
    tag = "projects",
    request_body = NewProjectRequest,
    responses(
        (status = 200, description = "Project created", body = crate::db::Project),
        (status = 400, description = "Empty project name", body = crate::error::ApiError),
        (status = 409, description = "Project already exists", body = crate::error::ApiError)
    )
)]
pub async fn new_project(
    State(state): State<AppState>,
    Json(request): Json<NewProjectRequest>,
) -> Result<impl IntoResponse> {
    let project = state.tracker.add_project(&request.project).await?;
    Ok(Json(project))
}
