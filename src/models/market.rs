use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of the CoinGecko `/coins/markets` listing. Fields the aggregator
/// does not read are kept in `extra` and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MarketCoin {
    pub fn looks_like_stablecoin(&self) -> bool {
        self.symbol.to_lowercase().contains("usd")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingCoin {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub thumb: Option<String>,
    pub rank: Option<u32>,
    pub current_price: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub score: u32,
    /// False for rows padded in from the gainers list.
    pub is_trending: bool,
}

impl TrendingCoin {
    pub fn from_gainer(coin: &MarketCoin) -> Self {
        Self {
            id: coin.id.clone(),
            name: coin.name.clone(),
            symbol: coin.symbol.clone(),
            thumb: coin.image.clone(),
            rank: coin.market_cap_rank,
            current_price: coin.current_price,
            price_change_24h: coin.price_change_percentage_24h,
            score: 0,
            is_trending: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coins: Option<Vec<TrendingCoin>>,
    pub market_data: Vec<MarketCoin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Trending,
    Gainers,
    MarketCap,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Trending => "trending",
            SortMode::Gainers => "gainers",
            SortMode::MarketCap => "market_cap",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trending" => Ok(SortMode::Trending),
            "gainers" => Ok(SortMode::Gainers),
            "market_cap" => Ok(SortMode::MarketCap),
            other => Err(format!("Unknown sort mode: {other}")),
        }
    }
}
