use crate::config::MonitorConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("Request timed out: {0}")]
    Timeout(reqwest::Error),

    #[error("{0}")]
    Transport(reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err)
        } else {
            FetchError::Transport(err)
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// One GET per call, no retries. Redirects follow the reqwest defaults.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    timeout: Duration,
    user_agent: String,
}

impl ReqwestFetcher {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }

    // Built per fetch so a bad header value fails the run instead of the process.
    fn build_client(&self) -> Result<Client, FetchError> {
        Ok(Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()?)
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let client = self.build_client()?;
        let res = client.get(parsed).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let html = res.text().await?;
        log::debug!("HTML length: {} bytes", html.len());
        Ok(html)
    }
}
