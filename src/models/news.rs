use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const GLOBAL_DEFAULT_IMAGE: &str = "/images/default-crypto-news.jpg";

/// News providers the aggregator knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewsSource {
    CryptoCompare,
    CoinTelegraph,
    #[serde(rename = "Bitcoin.com")]
    BitcoinCom,
    ZyCrypto,
}

impl NewsSource {
    pub const ALL: [NewsSource; 4] = [
        NewsSource::CryptoCompare,
        NewsSource::CoinTelegraph,
        NewsSource::BitcoinCom,
        NewsSource::ZyCrypto,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NewsSource::CryptoCompare => "CryptoCompare",
            NewsSource::CoinTelegraph => "CoinTelegraph",
            NewsSource::BitcoinCom => "Bitcoin.com",
            NewsSource::ZyCrypto => "ZyCrypto",
        }
    }

    pub fn default_image(&self) -> &'static str {
        default_image_for(self.name())
    }
}

impl fmt::Display for NewsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Placeholder artwork per provider name. Covers publishers that only show up
/// syndicated through other feeds, hence the lookup by name.
pub fn default_image_for(provider: &str) -> &'static str {
    match provider {
        "CryptoCompare" => "/images/cryptocompare-default.png",
        "CoinTelegraph" => "/images/cointelegraph-default.png",
        "Bitcoin.com" => "/images/bitcoin-default.png",
        "CryptoSlate" => "/images/cryptoslate-default.png",
        "NewsBTC" => "/images/newsbtc-default.png",
        "CryptoPotato" => "/images/cryptopotato-default.png",
        "BeInCrypto" => "/images/beincrypto-default.png",
        "U.Today" => "/images/utoday-default.png",
        "ZyCrypto" => "/images/zycrypto-default.png",
        _ => GLOBAL_DEFAULT_IMAGE,
    }
}

/// `?source=` selector for the news endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFilter {
    All,
    Only(NewsSource),
}

impl SourceFilter {
    pub fn includes(&self, source: NewsSource) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Only(only) => *only == source,
        }
    }
}

impl fmt::Display for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFilter::All => f.write_str("All"),
            SourceFilter::Only(source) => f.write_str(source.name()),
        }
    }
}

impl FromStr for SourceFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "All" {
            return Ok(SourceFilter::All);
        }
        NewsSource::ALL
            .iter()
            .find(|source| source.name() == s)
            .map(|source| SourceFilter::Only(*source))
            .ok_or_else(|| format!("Unknown news source: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub source: NewsSource,
    /// `None` when the provider's date was missing or unparseable.
    pub published_at: Option<DateTime<Utc>>,
    pub image_url: String,
    pub url: String,
    pub category: String,
    pub tags: Vec<String>,
}

impl NewsItem {
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.title, &self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_filter_parses_provider_names() {
        assert_eq!("All".parse::<SourceFilter>(), Ok(SourceFilter::All));
        assert_eq!(
            "Bitcoin.com".parse::<SourceFilter>(),
            Ok(SourceFilter::Only(NewsSource::BitcoinCom))
        );
        assert!("bitcoin.com".parse::<SourceFilter>().is_err());
        assert!("Nitter".parse::<SourceFilter>().is_err());
    }

    #[test]
    fn default_images_fall_back_to_global() {
        assert_eq!(
            NewsSource::ZyCrypto.default_image(),
            "/images/zycrypto-default.png"
        );
        assert_eq!(default_image_for("U.Today"), "/images/utoday-default.png");
        assert_eq!(default_image_for("SomeBlog"), GLOBAL_DEFAULT_IMAGE);
    }

    #[test]
    fn news_item_serializes_camel_case() {
        let item = NewsItem {
            id: "1".into(),
            title: "t".into(),
            description: String::new(),
            source: NewsSource::BitcoinCom,
            published_at: None,
            image_url: "/img.png".into(),
            url: "https://news.bitcoin.com/a".into(),
            category: "Crypto".into(),
            tags: vec![],
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["source"], "Bitcoin.com");
        assert_eq!(json["imageUrl"], "/img.png");
        assert!(json["publishedAt"].is_null());
    }
}
