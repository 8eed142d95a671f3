//! Upstream integrations. Each provider sits behind [`SourceAdapter`] and
//! returns records already mapped into the service's own types.

pub mod binance;
pub mod coingecko;
pub mod cryptocompare;
pub mod fear_greed;
pub mod images;
pub mod rss_feed;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::models::{
    error::SourceError,
    market::{MarketCoin, TrendingCoin},
    news::NewsItem,
    sentiment::{LongShortRatio, SentimentIndex},
};

pub use binance::BinanceLongShort;
pub use coingecko::{CoinGeckoMarkets, CoinGeckoTrending};
pub use cryptocompare::CryptoCompareNews;
pub use fear_greed::FearGreedIndex;
pub use rss_feed::RssFeedAdapter;

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    type Output: Send;

    fn provider(&self) -> &'static str;

    async fn fetch_normalized(&self) -> Result<Self::Output, SourceError>;
}

pub type NewsAdapter = Arc<dyn SourceAdapter<Output = Vec<NewsItem>>>;
pub type MarketsAdapter = Arc<dyn SourceAdapter<Output = Vec<MarketCoin>>>;
pub type TrendingAdapter = Arc<dyn SourceAdapter<Output = Vec<TrendingCoin>>>;
pub type SentimentAdapter = Arc<dyn SourceAdapter<Output = SentimentIndex>>;
pub type LongShortAdapter = Arc<dyn SourceAdapter<Output = LongShortRatio>>;

/// Decodes each raw record on its own so one malformed entry only costs
/// that entry.
pub(crate) fn decode_records<T: DeserializeOwned>(
    provider: &'static str,
    raw: Vec<Value>,
) -> Vec<T> {
    let total = raw.len();
    let decoded: Vec<T> = raw
        .into_iter()
        .filter_map(|record| serde_json::from_value(record).ok())
        .collect();

    if decoded.len() < total {
        debug!(
            provider,
            skipped = total - decoded.len(),
            "Skipped malformed records"
        );
    }
    decoded
}
