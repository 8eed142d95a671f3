//! Cache-first aggregation over the source adapters.
//!
//! Every operation checks its cache key first, refreshes from upstream on a
//! miss, writes successful results back and, depending on the key's
//! [`StalePolicy`], serves the last known snapshot when the refresh fails.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::{
    models::{
        cache::TtlCache,
        error::AggregationError,
        market::{MarketCoin, SortMode, TrendingCoin, TrendingResult},
        news::{NewsItem, NewsSource, SourceFilter},
        sentiment::{LongShortRatio, SentimentIndex},
    },
    sources::{
        BinanceLongShort, CoinGeckoMarkets, CoinGeckoTrending, CryptoCompareNews, FearGreedIndex,
        LongShortAdapter, MarketsAdapter, NewsAdapter, RssFeedAdapter, SentimentAdapter,
        TrendingAdapter,
    },
    utils::{config::Config, fetcher::Fetcher},
};

/// Trending lists shorter than this are padded with top gainers.
pub const TRENDING_TARGET: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalePolicy {
    /// Return the expired snapshot when the refresh fails.
    ServeStale,
    /// Fail rather than show old data.
    Strict,
}

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub news_ttl: Duration,
    pub trending_ttl: Duration,
    pub sentiment_ttl: Duration,
    pub long_short_ttl: Duration,
}

impl CachePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            news_ttl: config.news_ttl(),
            trending_ttl: config.trending_ttl(),
            sentiment_ttl: config.sentiment_ttl(),
            long_short_ttl: config.long_short_ttl(),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            news_ttl: Duration::minutes(5),
            trending_ttl: Duration::minutes(5),
            sentiment_ttl: Duration::hours(1),
            long_short_ttl: Duration::minutes(5),
        }
    }
}

/// The adapters one aggregator fans out to.
pub struct Sources {
    /// In fan-out order; earlier sources win deduplication ties.
    pub news: Vec<(NewsSource, NewsAdapter)>,
    pub markets: MarketsAdapter,
    pub trending: TrendingAdapter,
    pub sentiment: SentimentAdapter,
    pub long_short: LongShortAdapter,
}

impl Sources {
    pub fn from_config(config: &Config, fetcher: Fetcher) -> Self {
        let cryptocompare: NewsAdapter = Arc::new(CryptoCompareNews::new(
            config.cryptocompare_api_key.clone(),
            fetcher.clone(),
        ));
        let mut news = vec![(NewsSource::CryptoCompare, cryptocompare)];
        for source in NewsSource::ALL {
            if let Some(url) = RssFeedAdapter::default_feed_url(source) {
                let feed: NewsAdapter = Arc::new(RssFeedAdapter::new(source, url, fetcher.clone()));
                news.push((source, feed));
            }
        }

        Self {
            news,
            markets: Arc::new(CoinGeckoMarkets::new(fetcher.clone())),
            trending: Arc::new(CoinGeckoTrending::new(fetcher.clone())),
            sentiment: Arc::new(FearGreedIndex::new(fetcher.clone())),
            long_short: Arc::new(BinanceLongShort::new(fetcher)),
        }
    }
}

pub struct Aggregator {
    sources: Sources,
    policy: CachePolicy,
    news_cache: TtlCache<Vec<NewsItem>>,
    trending_cache: TtlCache<TrendingResult>,
    sentiment_cache: TtlCache<SentimentIndex>,
    long_short_cache: TtlCache<LongShortRatio>,
}

impl Aggregator {
    pub fn new(sources: Sources, policy: CachePolicy) -> Self {
        Self {
            sources,
            policy,
            news_cache: TtlCache::new(),
            trending_cache: TtlCache::new(),
            sentiment_cache: TtlCache::new(),
            long_short_cache: TtlCache::new(),
        }
    }

    pub async fn fetch_news(
        &self,
        filter: SourceFilter,
    ) -> Result<Vec<NewsItem>, AggregationError> {
        let key = format!("news:{filter}");
        cached(
            &self.news_cache,
            &key,
            self.policy.news_ttl,
            StalePolicy::ServeStale,
            self.refresh_news(filter),
        )
        .await
    }

    pub async fn fetch_trending(&self, sort: SortMode) -> Result<TrendingResult, AggregationError> {
        let key = format!("trending:{sort}");
        cached(
            &self.trending_cache,
            &key,
            self.policy.trending_ttl,
            StalePolicy::ServeStale,
            self.refresh_trending(sort),
        )
        .await
    }

    pub async fn fetch_sentiment(&self) -> Result<SentimentIndex, AggregationError> {
        cached(
            &self.sentiment_cache,
            "sentiment-index",
            self.policy.sentiment_ttl,
            StalePolicy::ServeStale,
            async {
                self.sources
                    .sentiment
                    .fetch_normalized()
                    .await
                    .map_err(|e| e.to_string())
            },
        )
        .await
    }

    /// Strict: a failed refresh is an error even when an old ratio is cached.
    pub async fn fetch_long_short(&self) -> Result<LongShortRatio, AggregationError> {
        cached(
            &self.long_short_cache,
            "long-short-ratio",
            self.policy.long_short_ttl,
            StalePolicy::Strict,
            async {
                self.sources
                    .long_short
                    .fetch_normalized()
                    .await
                    .map_err(|e| e.to_string())
            },
        )
        .await
    }

    async fn refresh_news(&self, filter: SourceFilter) -> Result<Vec<NewsItem>, String> {
        let selected: Vec<&NewsAdapter> = self
            .sources
            .news
            .iter()
            .filter(|(source, _)| filter.includes(*source))
            .map(|(_, adapter)| adapter)
            .collect();

        if selected.is_empty() {
            return Err(format!("no adapter registered for {filter}"));
        }

        let results = join_all(selected.iter().map(|adapter| adapter.fetch_normalized())).await;

        let mut batches = Vec::with_capacity(results.len());
        let mut failed = 0;
        for result in results {
            match result {
                Ok(items) => batches.push(items),
                Err(err) => {
                    warn!(provider = err.provider(), "News source failed: {}", err);
                    failed += 1;
                }
            }
        }

        if batches.is_empty() {
            return Err(format!("all {failed} news sources failed"));
        }

        let merged = merge_news(batches);
        info!(%filter, items = merged.len(), failed, "Aggregated news");
        Ok(merged)
    }

    async fn refresh_trending(&self, sort: SortMode) -> Result<TrendingResult, String> {
        match sort {
            SortMode::Trending => {
                let (markets, trending) = tokio::join!(
                    self.sources.markets.fetch_normalized(),
                    self.sources.trending.fetch_normalized()
                );
                let markets = markets.map_err(|e| e.to_string())?;
                let trending = trending.map_err(|e| e.to_string())?;

                Ok(TrendingResult {
                    coins: Some(pad_trending(trending, &markets, TRENDING_TARGET)),
                    market_data: markets,
                })
            }
            SortMode::Gainers | SortMode::MarketCap => {
                let mut markets = self
                    .sources
                    .markets
                    .fetch_normalized()
                    .await
                    .map_err(|e| e.to_string())?;
                sort_markets(&mut markets, sort);
                Ok(TrendingResult {
                    coins: None,
                    market_data: markets,
                })
            }
        }
    }
}

async fn cached<T, Fut>(
    cache: &TtlCache<T>,
    key: &str,
    ttl: Duration,
    stale: StalePolicy,
    refresh: Fut,
) -> Result<T, AggregationError>
where
    T: Clone,
    Fut: Future<Output = Result<T, String>>,
{
    if let Some(value) = cache.get_fresh(key, ttl) {
        debug!(key, "Cache hit");
        return Ok(value);
    }

    match refresh.await {
        Ok(value) => {
            cache.set(key, value.clone());
            Ok(value)
        }
        Err(reason) => {
            if stale == StalePolicy::ServeStale {
                if let Some(entry) = cache.entry(key) {
                    warn!(
                        key,
                        age_secs = entry.age().num_seconds(),
                        "Refresh failed, serving stale cache: {}",
                        reason
                    );
                    return Ok(entry.value);
                }
            }
            Err(AggregationError {
                key: key.to_string(),
                reason,
            })
        }
    }
}

/// Concatenates batches in fan-out order, keeps the first record per
/// `(title, url)`, then orders newest first with unknown dates last.
pub fn merge_news(batches: Vec<Vec<NewsItem>>) -> Vec<NewsItem> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut merged: Vec<NewsItem> = batches
        .into_iter()
        .flatten()
        .filter(|item| !(item.id.is_empty() && item.url.is_empty()))
        .filter(|item| {
            let (title, url) = item.dedup_key();
            seen.insert((title.to_string(), url.to_string()))
        })
        .collect();

    // Stable sort; `None` orders below every `Some`.
    merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    merged
}

/// Enriches organic trending coins with market prices and tops the list up
/// to `target` with the best 24h gainers not already present.
pub fn pad_trending(
    trending: Vec<TrendingCoin>,
    markets: &[MarketCoin],
    target: usize,
) -> Vec<TrendingCoin> {
    let mut coins: Vec<TrendingCoin> = trending
        .into_iter()
        .map(|mut coin| {
            if let Some(market) = markets.iter().find(|m| m.id == coin.id) {
                coin.current_price = coin.current_price.or(market.current_price);
                coin.price_change_24h =
                    coin.price_change_24h.or(market.price_change_percentage_24h);
                coin.rank = coin.rank.or(market.market_cap_rank);
            }
            coin
        })
        .collect();

    if coins.len() >= target {
        return coins;
    }

    let present: HashSet<&str> = coins.iter().map(|c| c.id.as_str()).collect();
    let mut gainers: Vec<&MarketCoin> = markets
        .iter()
        .filter(|m| !m.looks_like_stablecoin())
        .filter(|m| m.price_change_percentage_24h.is_some())
        .filter(|m| !present.contains(m.id.as_str()))
        .collect();
    gainers.sort_by(|a, b| {
        let a = a.price_change_percentage_24h.unwrap_or_default();
        let b = b.price_change_percentage_24h.unwrap_or_default();
        b.total_cmp(&a)
    });

    let padding: Vec<TrendingCoin> = gainers
        .into_iter()
        .take(target - coins.len())
        .map(TrendingCoin::from_gainer)
        .collect();
    debug!(organic = coins.len(), padded = padding.len(), "Padded trending list");
    coins.extend(padding);
    coins
}

pub fn sort_markets(markets: &mut [MarketCoin], sort: SortMode) {
    match sort {
        SortMode::Gainers => markets.sort_by(|a, b| {
            let a = a.price_change_percentage_24h.unwrap_or_default();
            let b = b.price_change_percentage_24h.unwrap_or_default();
            b.total_cmp(&a)
        }),
        SortMode::MarketCap => markets.sort_by(|a, b| {
            let a = a.market_cap.unwrap_or_default();
            let b = b.market_cap.unwrap_or_default();
            b.total_cmp(&a)
        }),
        SortMode::Trending => {}
    }
}
