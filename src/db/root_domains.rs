//! Root domain operations.

use crate::error::{DatabaseError, WriteError};
use crate::utils::normalize_hostname;
use crate::{Error, Result};
use chrono::Utc;

use super::{Database, RootDomain, RootDomainRow, to_millis};

impl Database {
    /// List the root domains of a project, alphabetically
    pub async fn get_root_domains(&self, project: &str) -> Result<Vec<RootDomain>> {
        let rows = sqlx::query_as::<_, RootDomainRow>(
            r#"
            SELECT project, root_domain, created_at
            FROM root_domains
            WHERE project = ?
            ORDER BY root_domain
            "#,
        )
        .bind(project)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get root domains: {}",
                e
            )))
        })?;

        Ok(rows.into_iter().map(RootDomain::from).collect())
    }

    /// Add root domains to a project, skipping those already present
    ///
    /// Domains are lowercased before insert. Each insert is independent; the
    /// returned list holds the ones that failed and is empty on full success.
    pub async fn upsert_root_domains(&self, project: &str, root_domains: &[String]) -> Vec<WriteError> {
        let now = to_millis(Utc::now());
        let mut errors = Vec::new();

        for raw in root_domains {
            let Some(root_domain) = normalize_hostname(raw) else {
                errors.push(WriteError {
                    key: raw.clone(),
                    message: "root domain is empty".to_string(),
                });
                continue;
            };

            let result = sqlx::query(
                r#"
                INSERT INTO root_domains (project, root_domain, created_at)
                VALUES (?, ?, ?)
                ON CONFLICT(project, root_domain) DO NOTHING
                "#,
            )
            .bind(project)
            .bind(&root_domain)
            .bind(now)
            .execute(&self.pool)
            .await;

            if let Err(e) = result {
                tracing::warn!(project = %project, root_domain = %root_domain, error = %e, "failed to insert root domain");
                errors.push(WriteError {
                    key: root_domain,
                    message: e.to_string(),
                });
            }
        }

        errors
    }
}
