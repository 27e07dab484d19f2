//! Discord channel notifier

use super::Notifier;
use crate::config::DiscordConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;

/// Discord rejects message content longer than this many characters
const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

/// Posts messages to one Discord channel through the bot REST API
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl DiscordNotifier {
    /// Create a notifier posting to `channel_id` under `api_base`
    pub fn new(api_base: &str, token: impl Into<String>, channel_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!(
                "{}/channels/{}/messages",
                api_base.trim_end_matches('/'),
                channel_id
            ),
            token: token.into(),
        }
    }

    /// Create a notifier from configuration
    pub fn from_config(config: &DiscordConfig) -> Self {
        Self::new(&config.api_base, config.token.clone(), &config.channel_id)
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn text(&self, message: &str) -> Result<()> {
        let content = truncate_content(message);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&CreateMessage { content: &content })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Notification(format!(
                "discord returned status {}: {}",
                status, body
            )));
        }

        tracing::debug!(endpoint = %self.endpoint, "discord message sent");
        Ok(())
    }
}

fn truncate_content(message: &str) -> String {
    if message.chars().count() <= MAX_CONTENT_CHARS {
        return message.to_string();
    }

    let mut content: String = message.chars().take(MAX_CONTENT_CHARS - 3).collect();
    content.push_str("...");
    content
}
