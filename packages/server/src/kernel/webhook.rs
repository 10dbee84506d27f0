use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

use super::BaseWebhookClient;

/// Webhook client backed by reqwest.
///
/// Without a configured timeout the client's defaults apply.
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build().context("Failed to build webhook HTTP client")?,
        })
    }
}

#[async_trait]
impl BaseWebhookClient for WebhookClient {
    async fn deliver(&self, url: &str, body: &serde_json::Value) -> Result<()> {
        info!("Sending webhook to: {}", url);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Webhook request to '{}' failed", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Webhook failed {}: {}", status, body);
            anyhow::bail!("Webhook responded with {}: {}", status, body);
        }

        info!("Webhook sent successfully");
        Ok(())
    }
}
