use std::collections::HashSet;

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::{
    models::{
        error::SourceError,
        news::{NewsItem, NewsSource},
    },
    sources::{decode_records, images, SourceAdapter},
    utils::fetcher::Fetcher,
};

pub const CRYPTOCOMPARE_BASE_URL: &str = "https://min-api.cryptocompare.com";

const PROVIDER: &str = "CryptoCompare";

#[derive(Deserialize)]
struct NewsEnvelope {
    #[serde(rename = "Data")]
    data: Value,
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct Article {
    id: Value,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    /// Epoch seconds; anything but an integer reads as unknown.
    #[serde(default)]
    published_on: Option<Value>,
    #[serde(default)]
    imageurl: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    categories: String,
}

/// CryptoCompare news API. Requires an API key; without one the source
/// fails permanently instead of being called.
pub struct CryptoCompareNews {
    base_url: String,
    api_key: Option<String>,
    fetcher: Fetcher,
}

impl CryptoCompareNews {
    pub fn new(api_key: Option<String>, fetcher: Fetcher) -> Self {
        Self::with_base_url(CRYPTOCOMPARE_BASE_URL, api_key, fetcher)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: Option<String>,
        fetcher: Fetcher,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            fetcher,
        }
    }
}

#[async_trait]
impl SourceAdapter for CryptoCompareNews {
    type Output = Vec<NewsItem>;

    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch_normalized(&self) -> Result<Vec<NewsItem>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::Unconfigured { provider: PROVIDER })?;

        let url = format!("{}/data/v2/news/?lang=EN&api_key={}", self.base_url, api_key);
        let envelope: NewsEnvelope = self
            .fetcher
            .get_json(&url)
            .await
            .map_err(|e| SourceError::fetch(PROVIDER, e))?;

        let items = normalize(envelope)?;
        info!(provider = PROVIDER, count = items.len(), "Fetched news");
        Ok(items)
    }
}

fn normalize(envelope: NewsEnvelope) -> Result<Vec<NewsItem>, SourceError> {
    let Value::Array(raw) = envelope.data else {
        return Err(SourceError::shape(
            PROVIDER,
            envelope
                .message
                .unwrap_or_else(|| "Data is not an array".to_string()),
        ));
    };

    // Syndicated stories show up more than once under different links.
    let mut seen_titles = HashSet::new();
    let items = decode_records::<Article>(PROVIDER, raw)
        .into_iter()
        .filter(|article| {
            let title = article.title.trim();
            title.is_empty() || seen_titles.insert(title.to_string())
        })
        .filter_map(to_news_item)
        .collect();
    Ok(items)
}

fn to_news_item(article: Article) -> Option<NewsItem> {
    let id = match article.id {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };
    if id.is_empty() && article.url.is_empty() {
        return None;
    }

    let source = NewsSource::CryptoCompare;
    let image_url = images::resolve_image(source, article.imageurl.as_deref(), &article.url);

    Some(NewsItem {
        id: if id.is_empty() { article.url.clone() } else { id },
        title: article.title.trim().to_string(),
        description: article.body.trim().to_string(),
        source,
        published_at: article
            .published_on
            .as_ref()
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        image_url,
        url: article.url,
        category: "Crypto".to_string(),
        tags: article
            .categories
            .split('|')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
    })
}
