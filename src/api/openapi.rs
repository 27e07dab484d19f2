//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the subnode REST API
///
/// Served at `/openapi.json` and, when enabled, browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "subnode REST API",
        version = "0.1.0",
        description = "Track projects, their root domains and discovered subdomains; trigger enumeration and liveness probes",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Projects
        crate::api::routes::get_project,
        crate::api::routes::new_project,

        // Root Domains
        crate::api::routes::list_root_domains,
        crate::api::routes::add_root_domains,

        // Subdomains
        crate::api::routes::list_subdomains,

        // Actions
        crate::api::routes::check_new_subs,
        crate::api::routes::dns_probe,
        crate::api::routes::http_probe,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(
        schemas(
            crate::db::Project,
            crate::db::RootDomain,
            crate::db::Subdomain,
            crate::error::ApiError,
            crate::error::ErrorDetail,
            crate::error::WriteError,
            crate::types::Stage,
            crate::types::Event,
            crate::types::StageReport,
            crate::api::routes::NewProjectRequest,
            crate::api::routes::NewRootDomainsRequest,
            crate::api::routes::NewRootDomainsResponse,
            crate::api::routes::SubdomainsQuery,
            crate::api::routes::ActionRequest,
            crate::api::routes::ActionAccepted,
        )
    ),
    tags(
        (name = "projects", description = "Project lookup and creation"),
        (name = "root_domains", description = "Root domains per project"),
        (name = "subdomains", description = "Discovered subdomains and their liveness"),
        (name = "actions", description = "Detached pipeline triggers"),
        (name = "system", description = "Health, OpenAPI and event stream")
    )
)]
pub struct ApiDoc;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/projects/{project}",
            "/projects/new",
            "/root_domains/{project}",
            "/root_domains/new",
            "/subdomains/{project}",
            "/actions/check_new_subs",
            "/actions/dns_probe",
            "/actions/http_probe",
            "/health",
            "/events",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing path {expected}"
            );
        }
    }
}
