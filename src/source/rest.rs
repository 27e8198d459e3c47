//! HTTP client for the backend's `/about` endpoints.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::BackendConfig;
use crate::source::{DataSource, FetchError};

/// Fetches health and stats JSON from a single backend.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    health_url: Url,
    stats_url: Url,
    timeout: Duration,
}

impl RestClient {
    /// Create a client for the configured backend.
    pub fn new(config: &BackendConfig, timeout: Duration) -> Result<Self, FetchError> {
        let base = config.base_url()?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("agent-check/", env!("CARGO_PKG_VERSION")))
            // The backend is a sidecar; never route it through a system proxy.
            .no_proxy()
            .build()
            .map_err(FetchError::Transport)?;

        Ok(Self {
            client,
            health_url: base.join(&config.health_path)?,
            stats_url: base.join(&config.stats_path)?,
            timeout,
        })
    }

    pub fn health_url(&self) -> &Url {
        &self.health_url
    }

    pub fn stats_url(&self) -> &Url {
        &self.stats_url
    }

    /// The client timeout bounds connect, headers and body together.
    async fn get(&self, url: &Url) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("application/json") {
            return Err(FetchError::ContentType(content_type));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err)
        }
    }
}

#[async_trait]
impl DataSource for RestClient {
    async fn fetch_health(&self) -> Result<Value, FetchError> {
        self.get(&self.health_url).await
    }

    async fn fetch_stats(&self) -> Result<Value, FetchError> {
        self.get(&self.stats_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_endpoint_urls() {
        let mut config = BackendConfig::default();
        config.host = "127.0.0.1".into();
        config.port = 9000;

        let client = RestClient::new(&config, Duration::from_millis(250)).unwrap();
        assert_eq!(client.health_url().as_str(), "http://127.0.0.1:9000/about/health");
        assert_eq!(client.stats_url().as_str(), "http://127.0.0.1:9000/about/stats");
    }

    #[test]
    fn rejects_unusable_host() {
        let mut config = BackendConfig::default();
        config.host = "bad host".into();
        assert!(matches!(
            RestClient::new(&config, Duration::from_secs(1)),
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
