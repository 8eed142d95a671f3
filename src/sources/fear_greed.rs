use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::{
    models::{error::SourceError, sentiment::SentimentIndex},
    sources::SourceAdapter,
    utils::fetcher::Fetcher,
};

pub const FEAR_GREED_URL: &str = "https://api.alternative.me/fng/";

const PROVIDER: &str = "alternative.me";

#[derive(Deserialize)]
struct Envelope {
    data: Vec<Reading>,
}

/// alternative.me sends every number as a string.
#[derive(Deserialize)]
struct Reading {
    value: String,
    value_classification: String,
    timestamp: String,
    #[serde(default)]
    time_until_update: Option<String>,
}

pub struct FearGreedIndex {
    url: String,
    fetcher: Fetcher,
}

impl FearGreedIndex {
    pub fn new(fetcher: Fetcher) -> Self {
        Self::with_url(FEAR_GREED_URL, fetcher)
    }

    pub fn with_url(url: impl Into<String>, fetcher: Fetcher) -> Self {
        Self {
            url: url.into(),
            fetcher,
        }
    }
}

#[async_trait]
impl SourceAdapter for FearGreedIndex {
    type Output = SentimentIndex;

    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_normalized(&self) -> Result<SentimentIndex, SourceError> {
        let envelope: Envelope = self
            .fetcher
            .get_json(&self.url)
            .await
            .map_err(|e| SourceError::fetch(PROVIDER, e))?;

        let index = normalize(envelope)?;
        info!(provider = PROVIDER, value = index.value, "Fetched sentiment index");
        Ok(index)
    }
}

fn normalize(envelope: Envelope) -> Result<SentimentIndex, SourceError> {
    let reading = envelope
        .data
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::shape(PROVIDER, "empty data array"))?;

    let value: u8 = reading
        .value
        .trim()
        .parse()
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| {
            SourceError::shape(PROVIDER, format!("bad index value {:?}", reading.value))
        })?;

    let timestamp: i64 = reading
        .timestamp
        .trim()
        .parse()
        .map_err(|_| {
            SourceError::shape(PROVIDER, format!("bad timestamp {:?}", reading.timestamp))
        })?;

    Ok(SentimentIndex {
        value,
        classification: reading.value_classification,
        timestamp,
        time_until_update: reading
            .time_until_update
            .and_then(|raw| raw.trim().parse().ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(raw: &str) -> Envelope {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn parses_string_encoded_reading() {
        let index = normalize(envelope(
            r#"{"name": "Fear and Greed Index", "data": [{"value": "40",
                "value_classification": "Fear", "timestamp": "1551157200",
                "time_until_update": "68499"}], "metadata": {"error": null}}"#,
        ))
        .unwrap();

        assert_eq!(
            index,
            SentimentIndex {
                value: 40,
                classification: "Fear".into(),
                timestamp: 1551157200,
                time_until_update: Some(68499),
            }
        );
    }

    #[test]
    fn rejects_out_of_range_or_empty() {
        let err = normalize(envelope(
            r#"{"data": [{"value": "140", "value_classification": "?", "timestamp": "1"}]}"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("bad index value"));

        assert!(normalize(envelope(r#"{"data": []}"#)).is_err());
    }

    #[test]
    fn missing_time_until_update_is_none() {
        let index = normalize(envelope(
            r#"{"data": [{"value": "75", "value_classification": "Greed",
                "timestamp": "1700000000"}]}"#,
        ))
        .unwrap();
        assert_eq!(index.time_until_update, None);
    }
}
