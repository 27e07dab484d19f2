//! Subdomain reads, upserts and liveness reconciliation.

use crate::error::{DatabaseError, WriteError};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::{Database, NewSubdomain, StateAttribute, Subdomain, SubdomainRow, to_millis};

const SUBDOMAIN_COLUMNS: &str =
    "project, subdomain, root_domain, has_dns_from, has_http_from, created_at";

impl Database {
    /// List a project's subdomains, optionally only those first seen at or after `after`
    pub async fn get_subdomains(
        &self,
        project: &str,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Subdomain>> {
        let sql = format!(
            "SELECT {SUBDOMAIN_COLUMNS} FROM subdomains \
             WHERE project = ? AND created_at >= ? \
             ORDER BY subdomain"
        );

        let rows = sqlx::query_as::<_, SubdomainRow>(&sql)
            .bind(project)
            .bind(after.map(to_millis).unwrap_or(i64::MIN))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get subdomains: {}",
                    e
                )))
            })?;

        Ok(rows.into_iter().map(Subdomain::from).collect())
    }

    /// Subdomains that currently resolve, optionally only those resolving since `after`
    pub async fn get_subdomains_with_dns(
        &self,
        project: &str,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Subdomain>> {
        self.get_subdomains_with(StateAttribute::Dns, project, after)
            .await
    }

    /// Subdomains that currently serve HTTP, optionally only those serving since `after`
    pub async fn get_subdomains_with_http(
        &self,
        project: &str,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Subdomain>> {
        self.get_subdomains_with(StateAttribute::Http, project, after)
            .await
    }

    async fn get_subdomains_with(
        &self,
        attribute: StateAttribute,
        project: &str,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Subdomain>> {
        let column = attribute.column();
        let sql = format!(
            "SELECT {SUBDOMAIN_COLUMNS} FROM subdomains \
             WHERE project = ? AND {column} IS NOT NULL AND {column} >= ? \
             ORDER BY subdomain"
        );

        let rows = sqlx::query_as::<_, SubdomainRow>(&sql)
            .bind(project)
            .bind(after.map(to_millis).unwrap_or(i64::MIN))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get subdomains with {}: {}",
                    column, e
                )))
            })?;

        Ok(rows.into_iter().map(Subdomain::from).collect())
    }

    /// Insert newly discovered subdomains, leaving existing records untouched
    ///
    /// New rows start with no DNS or HTTP state. Existing rows keep their
    /// original `created_at` and root domain.
    pub async fn upsert_subdomains(&self, project: &str, subdomains: &[NewSubdomain]) -> Vec<WriteError> {
        let now = to_millis(Utc::now());
        let mut errors = Vec::new();

        for sub in subdomains {
            let result = sqlx::query(
                r#"
                INSERT INTO subdomains (project, subdomain, root_domain, created_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(project, subdomain) DO NOTHING
                "#,
            )
            .bind(project)
            .bind(&sub.subdomain)
            .bind(&sub.root_domain)
            .bind(now)
            .execute(&self.pool)
            .await;

            if let Err(e) = result {
                tracing::warn!(project = %project, subdomain = %sub.subdomain, error = %e, "failed to upsert subdomain");
                errors.push(WriteError {
                    key: sub.subdomain.clone(),
                    message: e.to_string(),
                });
            }
        }

        errors
    }

    /// Reconcile DNS liveness verdicts
    pub async fn ensure_dns_state(&self, project: &str, verdicts: &HashMap<String, bool>) -> Vec<WriteError> {
        self.ensure_state(StateAttribute::Dns, project, verdicts)
            .await
    }

    /// Reconcile HTTP liveness verdicts
    pub async fn ensure_http_state(&self, project: &str, verdicts: &HashMap<String, bool>) -> Vec<WriteError> {
        self.ensure_state(StateAttribute::Http, project, verdicts)
            .await
    }

    /// Apply one conditional update per hostname
    ///
    /// `true` stamps the attribute with the current time only while it is
    /// NULL, so the first observation is kept across repeated positives.
    /// `false` clears it only while it is set. A condition that does not
    /// match, or a hostname with no stored record, is not a failure.
    pub async fn ensure_state(
        &self,
        attribute: StateAttribute,
        project: &str,
        verdicts: &HashMap<String, bool>,
    ) -> Vec<WriteError> {
        let column = attribute.column();
        let now = to_millis(Utc::now());
        let set_sql = format!(
            "UPDATE subdomains SET {column} = ? \
             WHERE project = ? AND subdomain = ? AND {column} IS NULL"
        );
        let clear_sql = format!(
            "UPDATE subdomains SET {column} = NULL \
             WHERE project = ? AND subdomain = ? AND {column} IS NOT NULL"
        );

        let mut hosts: Vec<_> = verdicts.iter().collect();
        hosts.sort_by(|a, b| a.0.cmp(b.0));

        let mut errors = Vec::new();

        for (host, alive) in hosts {
            let result = if *alive {
                sqlx::query(&set_sql)
                    .bind(now)
                    .bind(project)
                    .bind(host)
                    .execute(&self.pool)
                    .await
            } else {
                sqlx::query(&clear_sql)
                    .bind(project)
                    .bind(host)
                    .execute(&self.pool)
                    .await
            };

            match result {
                Ok(done) if done.rows_affected() == 0 => {
                    if !self.subdomain_exists(project, host).await {
                        tracing::debug!(project = %project, subdomain = %host, column, "no stored record to reconcile");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(project = %project, subdomain = %host, column, error = %e, "failed to reconcile state");
                    errors.push(WriteError {
                        key: host.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        errors
    }

    async fn subdomain_exists(&self, project: &str, subdomain: &str) -> bool {
        sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM subdomains WHERE project = ? AND subdomain = ?",
        )
        .bind(project)
        .bind(subdomain)
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.is_some())
        .unwrap_or(true)
    }
}
