//! Outbound notifications
//!
//! The pipeline only ever sends plain text. Delivery is fire-and-forget from
//! its point of view: a failing notifier is logged and reported as an event,
//! never retried and never allowed to fail a stage.

use crate::config::NotificationConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

mod discord;
mod webhook;

pub use discord::DiscordNotifier;
pub use webhook::{WebhookNotifier, WebhookPayload};

/// Maximum number of hostnames listed in one summary
pub const SUMMARY_LIMIT: usize = 60;

/// A channel that can deliver a text message
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Name used in logs and `NotificationFailed` events
    fn name(&self) -> &str;

    /// Deliver `message`
    async fn text(&self, message: &str) -> Result<()>;
}

/// Notifier used when no channel is configured
///
/// Writes the message to the log instead of sending it anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn text(&self, message: &str) -> Result<()> {
        tracing::info!(notification = %message, "no notifier configured");
        Ok(())
    }
}

/// Build every notifier the configuration asks for
///
/// Falls back to a single [`NoOpNotifier`] when nothing is configured.
pub fn from_config(config: &NotificationConfig) -> Vec<Arc<dyn Notifier>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

    if let Some(discord) = &config.discord {
        notifiers.push(Arc::new(DiscordNotifier::from_config(discord)));
    }

    for hook in &config.webhooks {
        notifiers.push(Arc::new(WebhookNotifier::from_config(hook)));
    }

    if notifiers.is_empty() {
        notifiers.push(Arc::new(NoOpNotifier));
    }

    notifiers
}

/// Format the message announcing `hosts`
///
/// Lists at most [`SUMMARY_LIMIT`] hostnames and always states the total.
///
/// ```
/// use subnode::notify::format_summary;
///
/// let text = format_summary("acme", "new subdomains", &["www.ex.com".to_string()]);
/// assert_eq!(text, "[acme] 1 new subdomains\nwww.ex.com");
/// ```
pub fn format_summary(project: &str, headline: &str, hosts: &[String]) -> String {
    let mut text = format!("[{}] {} {}", project, hosts.len(), headline);

    for host in hosts.iter().take(SUMMARY_LIMIT) {
        text.push('\n');
        text.push_str(host);
    }

    if hosts.len() > SUMMARY_LIMIT {
        text.push_str(&format!(
            "\n... and {} more ({} total)",
            hosts.len() - SUMMARY_LIMIT,
            hosts.len()
        ));
    }

    text
}
