//! Generic JSON webhook notifier

use super::Notifier;
use crate::config::WebhookConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

/// Body POSTed to a webhook
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookPayload {
    /// Notification text
    pub text: String,
    /// Unix timestamp (seconds) when the notification was sent
    pub timestamp: i64,
}

/// POSTs every notification as JSON to one URL
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    timeout: Duration,
}

impl WebhookNotifier {
    /// Create a notifier from configuration
    pub fn from_config(config: &WebhookConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.clone(),
            auth_header: config.auth_header.clone(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn text(&self, message: &str) -> Result<()> {
        let payload = WebhookPayload {
            text: message.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        };

        let mut request = self
            .client
            .post(&self.url)
            .json(&payload)
            .timeout(self.timeout);

        if let Some(auth) = &self.auth_header {
            request = request.header("Authorization", auth);
        }

        let response = match tokio::time::timeout(self.timeout, request.send()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Notification(format!(
                    "webhook timed out after {:?}",
                    self.timeout
                )));
            }
        };

        if !response.status().is_success() {
            return Err(Error::Notification(format!(
                "webhook returned status {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        tracing::debug!(url = %self.url, "webhook sent successfully");
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier(url: String, auth_header: Option<&str>, timeout: Duration) -> WebhookNotifier {
        WebhookNotifier::from_config(&WebhookConfig {
            url,
            auth_header: auth_header.map(str::to_string),
            timeout,
        })
    }

    #[tokio::test]
    async fn posts_json_payload_with_auth_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        notifier(
            format!("{}/hook", mock_server.uri()),
            Some("Bearer abc"),
            Duration::from_secs(5),
        )
        .text("[acme] 1 new subdomains\nwww.ex.com")
        .await
        .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let body: WebhookPayload = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body.text, "[acme] 1 new subdomains\nwww.ex.com");
        assert!(body.timestamp > 0);
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let result = notifier(mock_server.uri(), None, Duration::from_secs(5))
            .text("hello")
            .await;

        assert!(matches!(result, Err(Error::Notification(msg)) if msg.contains("500")));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&mock_server)
            .await;

        let result = notifier(mock_server.uri(), None, Duration::from_millis(200))
            .text("hello")
            .await;

        assert!(result.is_err());
    }
}
