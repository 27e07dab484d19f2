//! Root domain handlers.

use super::{NewRootDomainsRequest, NewRootDomainsResponse};
use crate::api::AppState;
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

/// GET /root_domains/:project - List a project's root domains
#[utoipa::path(
    get,
    path = "/root_domains/{project}",
    tag = "root_domains",
    params(
        ("project" = String, Path, description = "Project name")
    ),
    responses(
        (status = 200, description = "Root domains, ordered by name", body = Vec<crate::db::RootDomain>),
        (status = 404, description = "Project not found", body = crate::error::ApiError)
    )
)]
pub async fn list_root_domains(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> Result<impl IntoResponse> {
    let root_domains = state.tracker.get_root_domains(&project).await?;
    Ok(Json(root_domains))
}

/// PUT /root_domains/new - Add root domains to a project
#[utoipa::path(
    put,
    path = "/root_domains/new",
    tag = "root_domains",
    request_body = NewRootDomainsRequest,
    responses(
        (status = 200, description = "Root domains stored", body = NewRootDomainsResponse),
        (status = 400, description = "Empty project name or root domain list", body = crate::error::ApiError),
        (status = 404, description = "Project not found", body = crate::error::ApiError)
    )
)]
pub async fn add_root_domains(
    State(state): State<AppState>,
    Json(request): Json<NewRootDomainsRequest>,
) -> Result<impl IntoResponse> {
    let write_errors = state
        .tracker
        .add_root_domains(&request.project, &request.root_domains)
        .await?;
    let root_domains = state.tracker.get_root_domains(&request.project).await?;

    Ok(Json(NewRootDomainsResponse {
        root_domains,
        write_errors,
    }))
}
