//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`projects`] - Project lookup and creation
//! - [`root_domains`] - Root domain listing and insertion
//! - [`subdomains`] - Subdomain listing
//! - [`actions`] - Detached pipeline triggers
//! - [`system`] - Health, events, OpenAPI

use crate::db::RootDomain;
use crate::error::WriteError;
use serde::{Deserialize, Serialize};

mod actions;
mod projects;
mod root_domains;
mod subdomains;
mod system;

pub use actions::*;
pub use projects::*;
pub use root_domains::*;
pub use subdomains::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Request body for PUT /projects/new
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct NewProjectRequest {
    /// Project name
    pub project: String,
}

/// Request body for PUT /root_domains/new
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct NewRootDomainsRequest {
    /// Existing project name
    pub project: String,
    /// Root domains to add; already known ones are ignored
    pub root_domains: Vec<String>,
}

/// Response for PUT /root_domains/new
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct NewRootDomainsResponse {
    /// Every root domain of the project after the insert
    pub root_domains: Vec<RootDomain>,
    /// Domains that could not be stored
    pub write_errors: Vec<WriteError>,
}

/// Query parameters for GET /subdomains/:project
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubdomainsQuery {
    /// Only subdomains first seen at or after this RFC 3339 timestamp
    pub after: Option<String>,
}

/// Request body for POST /actions/*
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ActionRequest {
    /// Project to run against
    pub project: String,
    /// Hosts to probe instead of the stored candidates (probe actions only)
    #[serde(default)]
    pub subdomains: Option<Vec<String>>,
}

/// Response for POST /actions/*
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ActionAccepted {
    /// Always `"accepted"`
    pub status: String,
    /// Which action was scheduled
    pub action: String,
    /// Project the action runs against
    pub project: String,
}
