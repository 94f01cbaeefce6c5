// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// Source of raw page markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the markup at `url`.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Create a configured asynchronous HTTP client with browser-like headers.
pub fn create_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page body. Transport failures and non-success statuses become
/// [`AppError::Transport`].
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    log::debug!("Fetching {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::transport(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::transport(url, format!("HTTP status {status}")));
    }

    response.text().await.map_err(|e| AppError::transport(url, e))
}

/// Page source backed by a reqwest client, with a fixed retry policy.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    attempts: u32,
    delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
            attempts: config.retry_attempts.max(1),
            delay: Duration::from_secs(config.retry_delay_secs),
        })
    }

    /// Shared client, reused by the notifier.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Fetch with up to `attempts` tries, sleeping `delay` between them.
    pub async fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let mut attempt = 1;
        loop {
            match fetch_page(&self.client, url).await {
                Ok(body) => return Ok(body),
                Err(error) if attempt < self.attempts => {
                    log::warn!(
                        "Fetch attempt {}/{} failed for {}: {}",
                        attempt,
                        self.attempts,
                        url,
                        error
                    );
                    attempt += 1;
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.fetch_with_retry(url).await
    }
}
