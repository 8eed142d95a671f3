use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::{
    models::{
        error::SourceError,
        market::{MarketCoin, TrendingCoin},
    },
    sources::{decode_records, SourceAdapter},
    utils::fetcher::Fetcher,
};

pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

const MARKETS_PROVIDER: &str = "CoinGecko markets";
const TRENDING_PROVIDER: &str = "CoinGecko trending";

/// Top 250 coins by market cap, USD quoted.
pub struct CoinGeckoMarkets {
    base_url: String,
    fetcher: Fetcher,
}

impl CoinGeckoMarkets {
    pub fn new(fetcher: Fetcher) -> Self {
        Self::with_base_url(COINGECKO_BASE_URL, fetcher)
    }

    pub fn with_base_url(base_url: impl Into<String>, fetcher: Fetcher) -> Self {
        Self {
            base_url: base_url.into(),
            fetcher,
        }
    }
}

#[async_trait]
impl SourceAdapter for CoinGeckoMarkets {
    type Output = Vec<MarketCoin>;

    fn provider(&self) -> &'static str {
        MARKETS_PROVIDER
    }

    async fn fetch_normalized(&self) -> Result<Vec<MarketCoin>, SourceError> {
        let url = format!(
            "{}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=250&sparkline=false",
            self.base_url
        );
        let raw: Value = self
            .fetcher
            .get_json(&url)
            .await
            .map_err(|e| SourceError::fetch(MARKETS_PROVIDER, e))?;

        let Value::Array(records) = raw else {
            return Err(SourceError::shape(MARKETS_PROVIDER, "expected an array of coins"));
        };

        let coins: Vec<MarketCoin> = decode_records(MARKETS_PROVIDER, records);
        info!(provider = MARKETS_PROVIDER, count = coins.len(), "Fetched market data");
        Ok(coins)
    }
}

#[derive(Deserialize)]
struct TrendingEnvelope {
    coins: Vec<Value>,
}

#[derive(Deserialize)]
struct TrendingEntry {
    item: TrendingItem,
}

#[derive(Deserialize)]
struct TrendingItem {
    id: String,
    name: String,
    symbol: String,
    #[serde(default)]
    thumb: Option<String>,
    #[serde(default)]
    market_cap_rank: Option<u32>,
    #[serde(default)]
    score: u32,
}

/// CoinGecko's organic trending searches (usually 7 to 15 coins).
pub struct CoinGeckoTrending {
    base_url: String,
    fetcher: Fetcher,
}

impl CoinGeckoTrending {
    pub fn new(fetcher: Fetcher) -> Self {
        Self::with_base_url(COINGECKO_BASE_URL, fetcher)
    }

    pub fn with_base_url(base_url: impl Into<String>, fetcher: Fetcher) -> Self {
        Self {
            base_url: base_url.into(),
            fetcher,
        }
    }
}

#[async_trait]
impl SourceAdapter for CoinGeckoTrending {
    type Output = Vec<TrendingCoin>;

    fn provider(&self) -> &'static str {
        TRENDING_PROVIDER
    }

    async fn fetch_normalized(&self) -> Result<Vec<TrendingCoin>, SourceError> {
        let url = format!("{}/search/trending", self.base_url);
        let envelope: TrendingEnvelope = self
            .fetcher
            .get_json(&url)
            .await
            .map_err(|e| SourceError::fetch(TRENDING_PROVIDER, e))?;

        let entries: Vec<TrendingEntry> = decode_records(TRENDING_PROVIDER, envelope.coins);
        let coins: Vec<TrendingCoin> = entries
            .into_iter()
            .map(|entry| TrendingCoin {
                id: entry.item.id,
                name: entry.item.name,
                symbol: entry.item.symbol,
                thumb: entry.item.thumb,
                rank: entry.item.market_cap_rank,
                current_price: None,
                price_change_24h: None,
                score: entry.item.score,
                is_trending: true,
            })
            .collect();
        info!(provider = TRENDING_PROVIDER, count = coins.len(), "Fetched trending coins");
        Ok(coins)
    }
}
