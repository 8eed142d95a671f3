use serde::{Deserialize, Serialize};

/// Fear & greed reading, 0 (extreme fear) to 100 (extreme greed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentIndex {
    pub value: u8,
    pub classification: String,
    /// Unix seconds of the reading.
    pub timestamp: i64,
    /// Seconds until the provider publishes the next reading, when known.
    pub time_until_update: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongShortRatio {
    pub long_short_ratio: f64,
    /// Unix milliseconds of the sample.
    pub timestamp: i64,
}
