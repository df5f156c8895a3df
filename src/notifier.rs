use crate::config::SLACK_WEBHOOK_URL_ENV;
use crate::types::{DigestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Delivers a rendered notification to its destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn notifier_name(&self) -> String;

    /// Exactly one delivery attempt. Any failure is `NotificationDelivery`.
    async fn notify(&self, message: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SlackMessage<'a> {
    text: &'a str,
    unfurl_links: bool,
}

/// Posts to a Slack incoming webhook.
pub struct SlackNotifier {
    client: Client,
    webhook_url: Url,
}

impl std::fmt::Debug for SlackNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackNotifier")
            .field("webhook_host", &self.webhook_url.host_str())
            .finish()
    }
}

impl SlackNotifier {
    pub fn new(webhook_url: Option<&str>, timeout_seconds: u64) -> Result<Self> {
        let raw = webhook_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(DigestError::MissingCredential {
                name: SLACK_WEBHOOK_URL_ENV,
            })?;

        let webhook_url = Url::parse(raw)
            .map_err(|e| DigestError::Config(format!("{} is not a valid URL: {}", SLACK_WEBHOOK_URL_ENV, e)))?;
        if webhook_url.scheme() != "http" && webhook_url.scheme() != "https" {
            return Err(DigestError::Config(format!(
                "{} must be an http(s) URL",
                SLACK_WEBHOOK_URL_ENV
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self { client, webhook_url })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn notifier_name(&self) -> String {
        format!("Slack webhook ({})", self.webhook_url.host_str().unwrap_or("unknown"))
    }

    async fn notify(&self, message: &str) -> Result<()> {
        let payload = SlackMessage {
            text: message,
            unfurl_links: true,
        };
        debug!("message: {}", message);

        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| DigestError::NotificationDelivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DigestError::NotificationDelivery(format!(
                "webhook returned HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        info!("Delivered notification ({} chars)", message.chars().count());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_webhook_url() {
        assert!(matches!(
            SlackNotifier::new(None, 10),
            Err(DigestError::MissingCredential { name: "SLACK_WEBHOOK_URL" })
        ));
        assert!(matches!(
            SlackNotifier::new(Some(""), 10),
            Err(DigestError::MissingCredential { .. })
        ));
        assert!(matches!(SlackNotifier::new(Some("not a url"), 10), Err(DigestError::Config(_))));
        assert!(matches!(
            SlackNotifier::new(Some("ftp://hooks.example.com/x"), 10),
            Err(DigestError::Config(_))
        ));
        assert!(SlackNotifier::new(Some("https://hooks.slack.com/services/T/B/X"), 10).is_ok());
    }
}
