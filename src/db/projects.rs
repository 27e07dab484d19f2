//! Project operations.

use crate::error::DatabaseError;
use crate::{Error, Result};
use chrono::{DateTime, Utc};

use super::{Database, Project, ProjectRow, to_millis};

impl Database {
    /// Get a project by name
    pub async fn get_project(&self, name: &str) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(
            "SELECT name, created_at, last_dns_probed FROM projects WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get project: {}",
                e
            )))
        })?;

        Ok(row.map(Project::from))
    }

    /// Create a project
    ///
    /// A second project with the same name is a constraint violation.
    pub async fn add_project(&self, name: &str) -> Result<Project> {
        let now = Utc::now();

        sqlx::query("INSERT INTO projects (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(to_millis(now))
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    Error::Database(DatabaseError::ConstraintViolation(format!(
                        "project {} already exists",
                        name
                    )))
                }
                _ => Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert project: {}",
                    e
                ))),
            })?;

        self.get_project(name).await?.ok_or_else(|| {
            Error::Database(DatabaseError::NotFound(format!(
                "project {} vanished after insert",
                name
            )))
        })
    }

    /// Record the start time of the latest DNS probe stage
    pub async fn set_project_last_dns_probed(&self, name: &str, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE projects SET last_dns_probed = ? WHERE name = ?")
            .bind(to_millis(at))
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to update last_dns_probed: {}",
                    e
                )))
            })?;

        if result.rows_affected() == 0 {
            return Err(Error::ProjectNotFound(name.to_string()));
        }

        Ok(())
    }
}
