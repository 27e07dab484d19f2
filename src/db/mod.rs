//! Database layer for subnode
//!
//! Handles SQLite persistence for projects, their root domains and the
//! subdomains discovered under them.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`projects`] - Project CRUD and probe bookkeeping
//! - [`root_domains`] - Root domain listing and idempotent insert
//! - [`subdomains`] - Subdomain reads, upserts and liveness reconciliation
//!
//! All timestamps are Unix milliseconds assigned by this process at write time.
//! "What changed since T" reads compare against them, so the reconciliation
//! rule (first-seen timestamps are never overwritten) is what makes those
//! reads meaningful.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, sqlite::SqlitePool};
use utoipa::ToSchema;

mod migrations;
mod projects;
mod root_domains;
mod subdomains;

/// Project record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    /// Unique project name
    pub name: String,
    /// Unix milliseconds when the project was created
    pub created_at: i64,
    /// Unix milliseconds of the last DNS probe stage
    pub last_dns_probed: Option<i64>,
}

/// A tracked project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Project {
    /// Unique project name
    pub name: String,
    /// When the project was created
    pub created_at: DateTime<Utc>,
    /// Start time of the last DNS probe stage, if any ran
    pub last_dns_probed: Option<DateTime<Utc>>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            name: row.name,
            created_at: from_millis(row.created_at),
            last_dns_probed: row.last_dns_probed.map(from_millis),
        }
    }
}

/// Root domain record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct RootDomainRow {
    /// Owning project
    pub project: String,
    /// Apex domain
    pub root_domain: String,
    /// Unix milliseconds when the root domain was added
    pub created_at: i64,
}

/// An apex domain a project monitors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RootDomain {
    /// Owning project
    pub project: String,
    /// Apex domain
    pub root_domain: String,
    /// When the root domain was added
    pub created_at: DateTime<Utc>,
}

impl From<RootDomainRow> for RootDomain {
    fn from(row: RootDomainRow) -> Self {
        RootDomain {
            project: row.project,
            root_domain: row.root_domain,
            created_at: from_millis(row.created_at),
        }
    }
}

/// Subdomain record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct SubdomainRow {
    /// Owning project
    pub project: String,
    /// Hostname
    pub subdomain: String,
    /// Root domain the hostname was attributed to
    pub root_domain: String,
    /// Unix milliseconds when DNS resolution was first observed (cleared when it stops)
    pub has_dns_from: Option<i64>,
    /// Unix milliseconds when HTTP was first observed (cleared when it stops)
    pub has_http_from: Option<i64>,
    /// Unix milliseconds of the first sighting
    pub created_at: i64,
}

/// A discovered hostname and its liveness state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Subdomain {
    /// Owning project
    pub project: String,
    /// Hostname
    pub subdomain: String,
    /// Root domain the hostname was attributed to
    pub root_domain: String,
    /// Resolving since, or `None` when it does not resolve
    pub has_dns_from: Option<DateTime<Utc>>,
    /// Serving HTTP since, or `None` when it does not
    pub has_http_from: Option<DateTime<Utc>>,
    /// First sighting
    pub created_at: DateTime<Utc>,
}

impl From<SubdomainRow> for Subdomain {
    fn from(row: SubdomainRow) -> Self {
        Subdomain {
            project: row.project,
            subdomain: row.subdomain,
            root_domain: row.root_domain,
            has_dns_from: row.has_dns_from.map(from_millis),
            has_http_from: row.has_http_from.map(from_millis),
            created_at: from_millis(row.created_at),
        }
    }
}

/// New subdomain to be inserted into the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubdomain {
    /// Root domain the hostname belongs to
    pub root_domain: String,
    /// Hostname
    pub subdomain: String,
}

/// Liveness attribute maintained by the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAttribute {
    /// `has_dns_from`
    Dns,
    /// `has_http_from`
    Http,
}

impl StateAttribute {
    /// Column backing this attribute
    pub(crate) fn column(self) -> &'static str {
        match self {
            StateAttribute::Dns => "has_dns_from",
            StateAttribute::Http => "has_http_from",
        }
    }
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Database handle for subnode
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
