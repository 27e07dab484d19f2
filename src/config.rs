//! Configuration types for subnode

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};
use utoipa::ToSchema;

/// External tool paths
///
/// Every binary is optional. Unset paths are looked up in `PATH` when
/// `search_path` is enabled and fall back to `bin/<name>` otherwise.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ToolsConfig {
    /// Path to the amass executable
    #[serde(default)]
    pub amass: Option<PathBuf>,

    /// Path to the findomain executable
    #[serde(default)]
    pub findomain: Option<PathBuf>,

    /// Path to the subfinder executable
    #[serde(default)]
    pub subfinder: Option<PathBuf>,

    /// Path to the dnsx executable
    #[serde(default)]
    pub dnsx: Option<PathBuf>,

    /// Path to the httpx executable
    #[serde(default)]
    pub httpx: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            amass: None,
            findomain: None,
            subfinder: None,
            dnsx: None,
            httpx: None,
            search_path: true,
        }
    }
}

impl ToolsConfig {
    /// Resolve the executable for `name`, honoring an explicit path first
    pub fn resolve(&self, name: &str) -> PathBuf {
        let explicit = match name {
            "amass" => self.amass.as_ref(),
            "findomain" => self.findomain.as_ref(),
            "subfinder" => self.subfinder.as_ref(),
            "dnsx" => self.dnsx.as_ref(),
            "httpx" => self.httpx.as_ref(),
            _ => None,
        };

        if let Some(path) = explicit {
            return path.clone();
        }

        if self.search_path
            && let Ok(found) = which::which(name)
        {
            return found;
        }

        Path::new("bin").join(name)
    }
}

/// Probe and external process behavior
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProbeConfig {
    /// Concurrency passed to the HTTP probe binary (default: 50)
    #[serde(default = "default_http_threads")]
    pub http_threads: u32,

    /// Upper bound for a single external process, in seconds (default: 3600)
    #[serde(default = "default_process_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub process_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            http_threads: default_http_threads(),
            process_timeout: default_process_timeout(),
        }
    }
}

/// Discord channel notifier configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DiscordConfig {
    /// Bot token
    pub token: String,

    /// Channel the messages are posted to
    pub channel_id: String,

    /// REST API base URL (default: https://discord.com/api/v10)
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
}

/// Webhook configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookConfig {
    /// URL to POST to
    pub url: String,

    /// Optional authentication header value
    #[serde(default)]
    pub auth_header: Option<String>,

    /// Timeout for webhook requests (default: 30 seconds)
    #[serde(default = "default_webhook_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,
}

/// Notification configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct NotificationConfig {
    /// Discord channel notifier
    #[serde(default)]
    pub discord: Option<DiscordConfig>,

    /// Webhook configurations
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Path to SQLite database (default: "subnode.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for the tracker
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// External binary locations
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Probe concurrency and process limits
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Notification channels
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Data storage
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// REST API server
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;

        let config: Config = serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the pipeline unusable
    pub fn validate(&self) -> Result<()> {
        if self.probe.http_threads == 0 {
            return Err(invalid("probe.http_threads", "must be greater than zero"));
        }

        if self.probe.process_timeout.is_zero() {
            return Err(invalid(
                "probe.process_timeout",
                "must be greater than zero",
            ));
        }

        if let Some(discord) = &self.notifications.discord {
            if discord.token.trim().is_empty() {
                return Err(invalid("notifications.discord.token", "must not be empty"));
            }
            if discord.channel_id.trim().is_empty() {
                return Err(invalid(
                    "notifications.discord.channel_id",
                    "must not be empty",
                ));
            }
        }

        if self
            .notifications
            .webhooks
            .iter()
            .any(|w| w.url.trim().is_empty())
        {
            return Err(invalid("notifications.webhooks.url", "must not be empty"));
        }

        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> Error {
    Error::Config {
        message: format!("{key} {message}"),
        key: Some(key.to_string()),
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_http_threads() -> u32 {
    50
}

fn default_process_timeout() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_discord_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_webhook_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("subnode.db")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
