use std::str::FromStr;

use chrono::Duration;
use tracing::warn;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; MushNews/1.0;)";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub cryptocompare_api_key: Option<String>,
    pub user_agent: String,
    pub upstream_timeout_secs: u64,
    pub fetch_max_retries: u32,
    pub fetch_base_delay_ms: u64,
    pub outbound_max_concurrent: usize,
    pub outbound_min_delay_ms: u64,
    pub news_cache_ttl_secs: i64,
    pub trending_cache_ttl_secs: i64,
    pub long_short_cache_ttl_secs: i64,
    pub sentiment_cache_ttl_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "127.0.0.1:3000".to_string(),
            cryptocompare_api_key: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            upstream_timeout_secs: 5,
            fetch_max_retries: 3,
            fetch_base_delay_ms: 1000,
            outbound_max_concurrent: 8,
            outbound_min_delay_ms: 0,
            news_cache_ttl_secs: 5 * 60,
            trending_cache_ttl_secs: 5 * 60,
            long_short_cache_ttl_secs: 5 * 60,
            sentiment_cache_ttl_secs: 60 * 60,
        }
    }
}

impl Config {
    /// Reads the environment once; anything unset keeps its default.
    pub fn init() -> Self {
        let defaults = Config::default();

        let cryptocompare_api_key = std::env::var("CRYPTOCOMPARE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        if cryptocompare_api_key.is_none() {
            warn!("CRYPTOCOMPARE_API_KEY not set, CryptoCompare news will be unavailable");
        }

        Config {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            cryptocompare_api_key,
            user_agent: std::env::var("USER_AGENT").unwrap_or(defaults.user_agent),
            upstream_timeout_secs: env_or("UPSTREAM_TIMEOUT_SECS", defaults.upstream_timeout_secs),
            fetch_max_retries: env_or("FETCH_MAX_RETRIES", defaults.fetch_max_retries),
            fetch_base_delay_ms: env_or("FETCH_BASE_DELAY_MS", defaults.fetch_base_delay_ms),
            outbound_max_concurrent: env_or(
                "OUTBOUND_MAX_CONCURRENT",
                defaults.outbound_max_concurrent,
            ),
            outbound_min_delay_ms: env_or("OUTBOUND_MIN_DELAY_MS", defaults.outbound_min_delay_ms),
            news_cache_ttl_secs: env_or("NEWS_CACHE_TTL_SECS", defaults.news_cache_ttl_secs),
            trending_cache_ttl_secs: env_or(
                "TRENDING_CACHE_TTL_SECS",
                defaults.trending_cache_ttl_secs,
            ),
            long_short_cache_ttl_secs: env_or(
                "LONG_SHORT_CACHE_TTL_SECS",
                defaults.long_short_cache_ttl_secs,
            ),
            sentiment_cache_ttl_secs: env_or(
                "SENTIMENT_CACHE_TTL_SECS",
                defaults.sentiment_cache_ttl_secs,
            ),
        }
    }

    pub fn news_ttl(&self) -> Duration {
        ttl(self.news_cache_ttl_secs)
    }

    pub fn trending_ttl(&self) -> Duration {
        ttl(self.trending_cache_ttl_secs)
    }

    pub fn long_short_ttl(&self) -> Duration {
        ttl(self.long_short_cache_ttl_secs)
    }

    pub fn sentiment_ttl(&self) -> Duration {
        ttl(self.sentiment_cache_ttl_secs)
    }
}

/// Longest TTL accepted from the environment (ten years).
const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

fn ttl(secs: i64) -> Duration {
    Duration::seconds(secs.clamp(0, MAX_TTL_SECS))
}

fn env_or<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => parse_or(name, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(name: &str, raw: &str, default: T) -> T {
    raw.trim().parse().unwrap_or_else(|_| {
        warn!("Invalid value {:?} for {}, using {}", raw, name, default);
        default
    })
}
