use std::time::Duration;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::Serialize,
    tracing::debug,
    voicewatch_config::PushConfig,
};

use crate::{DeliveryError, Result, sink::PushSink};

#[derive(Debug, Serialize)]
struct PushPayload<'a> {
    title: &'a str,
    body: &'a str,
}

/// Posts `{"title", "body"}` JSON to a push gateway webhook.
pub struct WebhookPushSink {
    client: reqwest::Client,
    url: String,
    token: Option<Secret<String>>,
}

impl WebhookPushSink {
    pub fn from_config(config: &PushConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DeliveryError::external("build push client", e))?;
        Ok(Self {
            client,
            url: config.url.clone(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl PushSink for WebhookPushSink {
    async fn send_push(&self, title: &str, body: &str) -> Result<()> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&PushPayload { title, body });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::external("send push", e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                sink: "push",
                status: status.as_u16(),
            });
        }
        debug!(status = status.as_u16(), title, "push delivered");
        Ok(())
    }
}
