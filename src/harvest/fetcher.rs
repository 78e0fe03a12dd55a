//! Rate-limited HTTP fetcher
//!
//! This module handles every request the harvester makes to the source API:
//! - Building the HTTP client with the identifying user agent
//! - One GET per attempt with a fixed header set and per-request timeout
//! - Bounded exponential backoff on rate limits and transient failures

use crate::config::{Config, RetryConfig, UserAgentConfig};
use crate::{FetchError, HarvestError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Retry limits for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, across rate-limit signals and other failures
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.initial_backoff, self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

/// Doubling backoff schedule capped at a maximum
///
/// Yields the current delay and doubles it for the next call, so the sequence
/// is non-decreasing and never exceeds the cap.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            current: initial.min(max),
            max,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_delay())
    }
}

/// Outcome of a single failed attempt
#[derive(Debug)]
enum AttemptError {
    /// HTTP 429 or 503
    RateLimited(StatusCode),
    /// Network error, other non-2xx status, or malformed body
    Failed(String),
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Per-request timeout
/// * `api_key` - Optional static credential, sent as a bearer token
///
/// # Example
///
/// ```no_run
/// use catalog_harvester::config::UserAgentConfig;
/// use catalog_harvester::harvest::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30), None).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
    api_key: Option<&str>,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(key) = api_key {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", key)) {
            headers.insert(AUTHORIZATION, value);
        } else {
            tracing::warn!("api-key contains characters not allowed in a header; ignoring it");
        }
    }

    Client::builder()
        .user_agent(user_agent.header_value())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues GET requests against the source API with bounded retry
///
/// One fetcher (and one connection pool) is shared by every component of a
/// run; it holds no mutable state.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    base_url: Url,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Creates a fetcher from the harvest configuration
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.retry.timeout_secs),
            config.source.api_key.as_deref(),
        )?;
        let base_url = Url::parse(&config.source.base_url)
            .map_err(|e| crate::ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

        Ok(Self::with_client(
            client,
            base_url,
            RetryPolicy::from(&config.retry),
        ))
    }

    pub fn with_client(client: Client, base_url: Url, policy: RetryPolicy) -> Self {
        Self {
            client,
            base_url,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Resolves a path (or absolute URL) against the base URL and appends
    /// the query parameters
    pub fn request_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, FetchError> {
        let mut url = self.base_url.join(path).map_err(|e| FetchError::InvalidUrl {
            url: path.to_string(),
            reason: e.to_string(),
        })?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Fetches a JSON body with retry
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 429 / 503 | Sleep current backoff, double it (capped), retry |
    /// | Network error, other non-2xx, malformed JSON | Sleep current backoff, double it (capped), retry |
    /// | Attempts exhausted | `FetchError::TooManyRetries` |
    ///
    /// No sleep follows the final attempt.
    pub async fn fetch(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let url = self.request_url(path, query)?;
        let mut backoff = self.policy.backoff();
        let mut last_error = String::new();

        for attempt in 1..=self.policy.max_attempts {
            match self.attempt(&url).await {
                Ok(body) => return Ok(body),
                Err(AttemptError::RateLimited(status)) => {
                    tracing::warn!(
                        "Rate limited ({}) on {}, attempt {}/{}",
                        status.as_u16(),
                        url,
                        attempt,
                        self.policy.max_attempts
                    );
                    last_error = format!("HTTP {}", status.as_u16());
                }
                Err(AttemptError::Failed(error)) => {
                    tracing::warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt,
                        self.policy.max_attempts,
                        url,
                        error
                    );
                    last_error = error;
                }
            }

            if attempt < self.policy.max_attempts {
                let delay = backoff.next_delay();
                tracing::debug!("Backing off {:?} before retrying {}", delay, url);
                tokio::time::sleep(delay).await;
            }
        }

        Err(FetchError::TooManyRetries {
            url: url.to_string(),
            attempts: self.policy.max_attempts,
            last_error,
        })
    }

    async fn attempt(&self, url: &Url) -> Result<Value, AttemptError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AttemptError::Failed(classify_network_error(&e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(AttemptError::RateLimited(status));
        }
        if !status.is_success() {
            return Err(AttemptError::Failed(format!("HTTP {}", status.as_u16())));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AttemptError::Failed(format!("malformed body: {}", e)))
    }
}

fn classify_network_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    }
}
