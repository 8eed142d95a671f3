use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::{
    models::{error::SourceError, sentiment::LongShortRatio},
    sources::SourceAdapter,
    utils::fetcher::Fetcher,
};

pub const BINANCE_FUTURES_URL: &str = "https://fapi.binance.com";

const PROVIDER: &str = "Binance";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RatioSample {
    long_short_ratio: String,
    timestamp: i64,
}

/// Global long/short account ratio for one futures symbol.
pub struct BinanceLongShort {
    base_url: String,
    symbol: String,
    period: String,
    fetcher: Fetcher,
}

impl BinanceLongShort {
    pub fn new(fetcher: Fetcher) -> Self {
        Self::with_base_url(BINANCE_FUTURES_URL, fetcher)
    }

    pub fn with_base_url(base_url: impl Into<String>, fetcher: Fetcher) -> Self {
        Self {
            base_url: base_url.into(),
            symbol: "BTCUSDT".to_string(),
            period: "5m".to_string(),
            fetcher,
        }
    }
}

#[async_trait]
impl SourceAdapter for BinanceLongShort {
    type Output = LongShortRatio;

    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_normalized(&self) -> Result<LongShortRatio, SourceError> {
        let url = format!(
            "{}/futures/data/globalLongShortAccountRatio?symbol={}&period={}",
            self.base_url, self.symbol, self.period
        );
        let samples: Vec<RatioSample> = self
            .fetcher
            .get_json(&url)
            .await
            .map_err(|e| SourceError::fetch(PROVIDER, e))?;

        let ratio = latest(samples)?;
        info!(provider = PROVIDER, ratio = ratio.long_short_ratio, "Fetched long/short ratio");
        Ok(ratio)
    }
}

/// Binance returns the window oldest-first; pick the newest sample.
fn latest(samples: Vec<RatioSample>) -> Result<LongShortRatio, SourceError> {
    let sample = samples
        .into_iter()
        .max_by_key(|s| s.timestamp)
        .ok_or_else(|| SourceError::shape(PROVIDER, "no ratio samples"))?;

    let long_short_ratio: f64 = sample
        .long_short_ratio
        .trim()
        .parse()
        .ok()
        .filter(|r: &f64| r.is_finite())
        .ok_or_else(|| {
            SourceError::shape(PROVIDER, format!("bad ratio {:?}", sample.long_short_ratio))
        })?;

    Ok(LongShortRatio {
        long_short_ratio,
        timestamp: sample.timestamp,
    })
}
