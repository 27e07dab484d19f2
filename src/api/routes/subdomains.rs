//! Subdomain handlers.

use super::SubdomainsQuery;
use crate::api::AppState;
use crate::error::{Error, Result};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};

/// GET /subdomains/:project - List a project's subdomains
#[utoipa::path(
    get,
    path = "/subdomains/{project}",
    tag = "subdomains",
    params(
        ("project" = String, Path, description = "Project name"),
        SubdomainsQuery
    ),
    responses(
        (status = 200, description = "Subdomains, ordered by hostname", body = Vec<crate::db::Subdomain>),
        (status = 400, description = "Malformed `after` timestamp", body = crate::error::ApiError),
        (status = 404, description = "Project not found", body = crate::error::ApiError)
    )
)]
pub async fn list_subdomains(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Query(query): Query<SubdomainsQuery>,
) -> Result<impl IntoResponse> {
    let after = query.after.as_deref().map(parse_after).transpose()?;
    let subdomains = state.tracker.get_subdomains(&project, after).await?;
    Ok(Json(subdomains))
}

fn parse_after(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Validation(format!("invalid 'after' timestamp '{}': {}", raw, e)))
}
