use crate::config::HttpConfig;
use crate::domain::ports::FeedTransport;
use crate::utils::error::{FeedError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// `FeedTransport` over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedTransport for ReqwestTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }
        // error envelopes carry the details the caller reports
        if is_api_envelope(&body) {
            tracing::debug!("API error envelope with status {} from {}", status, url);
            return Ok(body);
        }
        Err(FeedError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

fn is_api_envelope(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .map(|v| v.get("result").is_some())
        .unwrap_or(false)
}
