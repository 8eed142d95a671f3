use std::future::Future;
use std::time::Duration;

use http::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::error::FetchError;
use crate::utils::{config::Config, rate_limiter::RateLimiter};

pub const ACCEPT_JSON: &str = "application/json";
pub const ACCEPT_FEED: &str =
    "application/rss+xml, application/xml, application/atom+xml, text/xml;q=0.9, */*;q=0.8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(base_delay_ms),
        }
    }

    /// Linear backoff: the wait after the n-th failed attempt is `base * n`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.checked_mul(attempt).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1000)
    }
}

/// Runs `op` until it succeeds or `policy.max_retries` attempts have failed,
/// sleeping between attempts. The last error is returned.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let attempts = policy.max_retries.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= attempts => {
                warn!(%label, attempt, "giving up: {}", err);
                return Err(err);
            }
            Err(err) => {
                let delay = policy.delay_after(attempt);
                debug!(%label, attempt, ?delay, "retrying after error: {}", err);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Shared outbound HTTP client: identifying User-Agent, per-call timeout,
/// the outbound limiter and linear retry around every GET.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: Client,
    limiter: RateLimiter,
    retry: RetryPolicy,
    timeout: Duration,
    user_agent: String,
}

impl Fetcher {
    pub fn new(
        client: Client,
        limiter: RateLimiter,
        retry: RetryPolicy,
        timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            client,
            limiter,
            retry,
            timeout,
            user_agent: user_agent.into(),
        }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        Self::new(
            client,
            RateLimiter::new(config.outbound_max_concurrent, config.outbound_min_delay_ms),
            RetryPolicy::new(config.fetch_max_retries, config.fetch_base_delay_ms),
            Duration::from_secs(config.upstream_timeout_secs),
            config.user_agent.clone(),
        )
    }

    pub async fn get_text(&self, url: &str, accept: &str) -> Result<String, FetchError> {
        retry_with_backoff(self.retry, url, |_| self.attempt(url, accept)).await
    }

    /// Body decoding happens once, after the retried transfer; a shape error
    /// is not retried.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let body = self.get_text(url, ACCEPT_JSON).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn attempt(&self, url: &str, accept: &str) -> Result<String, FetchError> {
        let _guard = self.limiter.acquire().await;

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, accept)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.text().await?)
    }
}
