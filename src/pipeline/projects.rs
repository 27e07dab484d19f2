//! Project and root domain management.

use crate::db::{Project, RootDomain, Subdomain};
use crate::error::{Error, Result, WriteError};
use chrono::{DateTime, Utc};

use super::Tracker;

impl Tracker {
    /// Create a project
    ///
    /// The name is trimmed; an empty name is a validation error and an
    /// existing one a constraint violation.
    pub async fn add_project(&self, name: &str) -> Result<Project> {
        let name = require_project_name(name)?;
        let project = self.db.add_project(name).await?;
        tracing::info!(project = %name, "project created");
        Ok(project)
    }

    /// Fetch a project, failing with [`Error::ProjectNotFound`] when absent
    pub async fn get_project(&self, name: &str) -> Result<Project> {
        let name = require_project_name(name)?;
        self.db
            .get_project(name)
            .await?
            .ok_or_else(|| Error::ProjectNotFound(name.to_string()))
    }

    /// Root domains of an existing project
    pub async fn get_root_domains(&self, project: &str) -> Result<Vec<RootDomain>> {
        let project = self.get_project(project).await?;
        self.db.get_root_domains(&project.name).await
    }

    /// Add root domains to an existing project
    ///
    /// Returns the per-domain write failures; an empty list means every domain
    /// is now stored.
    pub async fn add_root_domains(&self, project: &str, root_domains: &[String]) -> Result<Vec<WriteError>> {
        if root_domains.is_empty() {
            return Err(Error::Validation("root_domains is empty".to_string()));
        }

        let project = self.get_project(project).await?;
        let errors = self.db.upsert_root_domains(&project.name, root_domains).await;

        for err in &errors {
            tracing::warn!(project = %project.name, error = %err, "couldn't store root domain");
        }

        Ok(errors)
    }

    /// Subdomains of an existing project, optionally only those first seen at or after `after`
    pub async fn get_subdomains(&self, project: &str, after: Option<DateTime<Utc>>) -> Result<Vec<Subdomain>> {
        let project = self.get_project(project).await?;
        self.db.get_subdomains(&project.name, after).await
    }
}

pub(crate) fn require_project_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("project is empty".to_string()));
    }
    Ok(name)
}
