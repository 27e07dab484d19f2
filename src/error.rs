//! Error types for subnode
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Database, Config, notifications)
//! - Per-record storage write failures returned by bulk writers
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for subnode operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for subnode
///
/// Errors raised inside a detached pipeline run never reach the caller that
/// triggered it; they are logged at the smallest unit of work that failed.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "probe.http_threads")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Project does not exist
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// Request input failed validation (empty project name, empty domain list, ...)
    #[error("validation error: {0}")]
    Validation(String),

    /// Shutdown in progress - not accepting new pipeline runs
    #[error("shutdown in progress: not accepting new pipeline runs")]
    ShuttingDown,

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Notification channel rejected a message
    #[error("notification error: {0}")]
    Notification(String),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),

    /// Constraint violation (e.g., duplicate key)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// A single failed write inside a bulk operation
///
/// Bulk writers issue one independent statement per record and collect the
/// failures instead of aborting; a conditional update whose condition did not
/// match is not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WriteError {
    /// Record key the write was addressed to (hostname or root domain)
    pub key: String,
    /// Storage error message
    pub message: String,
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "project_not_found",
///     "message": "project not found: acme",
///     "details": {
///       "project": "acme"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,

            Error::ProjectNotFound(_) => 404,
            Error::Database(DatabaseError::NotFound(_)) => 404,

            Error::Database(DatabaseError::ConstraintViolation(_)) => 409,

            Error::Database(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,

            Error::Network(_) => 502,
            Error::Notification(_) => 502,

            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::ProjectNotFound(_) => "project_not_found",
            Error::Database(DatabaseError::NotFound(_)) => "not_found",
            Error::Database(DatabaseError::ConstraintViolation(_)) => "conflict",
            Error::Database(_) => "database_error",
            Error::Io(_) => "io_error",
            Error::ShuttingDown => "shutting_down",
            Error::Network(_) => "network_error",
            Error::Notification(_) => "notification_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::ProjectNotFound(project) => Some(serde_json::json!({
                "project": project,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    /// Returns (Error, expected_status_code, expected_error_code) for every
    /// match arm in ToHttpStatus.
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "bad value".into(),
                    key: Some("probe.http_threads".into()),
                },
                400,
                "config_error",
            ),
            (
                Error::Validation("project is empty".into()),
                400,
                "validation_error",
            ),
            (
                Error::ProjectNotFound("acme".into()),
                404,
                "project_not_found",
            ),
            (
                Error::Database(DatabaseError::NotFound("project acme".into())),
                404,
                "not_found",
            ),
            (
                Error::Database(DatabaseError::ConstraintViolation("dup".into())),
                409,
                "conflict",
            ),
            (
                Error::Database(DatabaseError::QueryFailed("timeout".into())),
                500,
                "database_error",
            ),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (
                Error::Notification("discord returned 401".into()),
                502,
                "notification_error",
            ),
            (Error::ShuttingDown, 503, "shutting_down"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_and_code() {
        for (error, status, code) in all_error_variants() {
            assert_eq!(error.status_code(), status, "status for {error:?}");
            assert_eq!(error.error_code(), code, "code for {error:?}");
        }
    }

    #[test]
    fn project_not_found_carries_project_in_details() {
        let api_error: ApiError = Error::ProjectNotFound("acme".into()).into();

        assert_eq!(api_error.error.code, "project_not_found");
        assert!(api_error.error.message.contains("acme"));
        assert_eq!(api_error.error.details.unwrap()["project"], "acme");
    }

    #[test]
    fn config_error_exposes_offending_key() {
        let api_error: ApiError = Error::Config {
            message: "must be positive".into(),
            key: Some("probe.process_timeout".into()),
        }
        .into();

        assert_eq!(api_error.error.code, "config_error");
        assert_eq!(
            api_error.error.details.unwrap()["key"],
            "probe.process_timeout"
        );
    }

    #[test]
    fn errors_without_context_have_no_details() {
        let api_error: ApiError = Error::ShuttingDown.into();
        assert!(api_error.error.details.is_none());

        let json = serde_json::to_value(&api_error).unwrap();
        assert!(
            json["error"].get("details").is_none(),
            "details must be omitted when absent"
        );
    }

    #[test]
    fn write_error_display_includes_key_and_message() {
        let err = WriteError {
            key: "www.example.com".into(),
            message: "database is locked".into(),
        };
        assert_eq!(err.to_string(), "www.example.com: database is locked");
    }
}
