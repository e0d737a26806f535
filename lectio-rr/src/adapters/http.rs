//! Shared HTTP layer for provider adapters
//!
//! One `reqwest::Client` and one rate limiter per adapter. Transient statuses
//! (429, 5xx) are retried with a linear backoff; everything else fails fast.

use crate::config::HttpConfig;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{header, Client, StatusCode};
use std::num::NonZeroU32;
use thiserror::Error;
use tracing::debug;

/// Fetch or parse failure inside one adapter
///
/// Never crosses the adapter boundary: adapters log it and return no
/// candidates.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned an empty body")]
    EmptyBody { url: String },

    #[error("could not parse {url}: {message}")]
    Parse { url: String, message: String },

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Source of raw provider pages
///
/// Separates fetching from parsing so adapters can be exercised offline.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the body at `url`; non-empty on success
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// `reqwest`-backed fetcher with rate limiting and retries
pub struct HttpFetcher {
    client: Client,
    limiter: DefaultDirectRateLimiter,
    config: HttpConfig,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&config.user_agent)
                .map_err(|e| FetchError::Client(format!("invalid user agent: {}", e)))?,
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_str(&config.accept_language)
                .map_err(|e| FetchError::Client(format!("invalid accept-language: {}", e)))?,
        );

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
            config: config.clone(),
        })
    }

    async fn get_once(&self, url: &str) -> Result<(StatusCode, String), FetchError> {
        self.limiter.until_ready().await;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Ok((status, String::new()));
        }

        let body = response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: format!("reading body: {}", e),
        })?;
        Ok((status, body))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut retry = 0;
        loop {
            let (status, body) = self.get_once(url).await?;

            if status.is_success() {
                if body.trim().is_empty() {
                    return Err(FetchError::EmptyBody {
                        url: url.to_string(),
                    });
                }
                debug!(url = %url, bytes = body.len(), "Fetched provider page");
                return Ok(body);
            }

            if is_retryable(status) && retry < self.config.max_retries {
                retry += 1;
                let wait = self.config.backoff_for(retry);
                debug!(
                    url = %url,
                    status = status.as_u16(),
                    retry,
                    wait_ms = wait.as_millis() as u64,
                    "Transient HTTP status, retrying"
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
    }
}

/// 429 and 5xx are worth another attempt
pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
