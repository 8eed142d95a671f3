use std::time::Duration;

use reqwest::Client;

use crate::{
    aggregator::{Aggregator, CachePolicy, Sources},
    utils::{config::Config, fetcher::Fetcher},
};

pub struct AppState {
    pub config: Config,
    pub aggregator: Aggregator,
}

impl AppState {
    /// Builds the process-wide HTTP client, adapters and caches. The caches
    /// live as long as the returned state.
    pub fn init(config: Config) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;
        let fetcher = Fetcher::from_config(&config, http_client);
        let aggregator = Aggregator::new(
            Sources::from_config(&config, fetcher),
            CachePolicy::from_config(&config),
        );

        Ok(Self { config, aggregator })
    }

    #[cfg(test)]
    pub fn with_aggregator(config: Config, aggregator: Aggregator) -> Self {
        Self { config, aggregator }
    }
}
