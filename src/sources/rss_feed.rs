use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rss::Channel;
use tracing::{debug, info};

use crate::{
    models::{
        error::SourceError,
        news::{NewsItem, NewsSource},
    },
    sources::{images, SourceAdapter},
    utils::fetcher::{Fetcher, ACCEPT_FEED},
};

/// A publisher's RSS feed.
pub struct RssFeedAdapter {
    source: NewsSource,
    url: String,
    fetcher: Fetcher,
}

impl RssFeedAdapter {
    pub fn new(source: NewsSource, url: impl Into<String>, fetcher: Fetcher) -> Self {
        Self {
            source,
            url: url.into(),
            fetcher,
        }
    }

    pub fn default_feed_url(source: NewsSource) -> Option<&'static str> {
        match source {
            NewsSource::CoinTelegraph => Some("https://cointelegraph.com/rss"),
            NewsSource::BitcoinCom => Some("https://news.bitcoin.com/feed/"),
            NewsSource::ZyCrypto => Some("https://zycrypto.com/feed/"),
            NewsSource::CryptoCompare => None,
        }
    }
}

#[async_trait]
impl SourceAdapter for RssFeedAdapter {
    type Output = Vec<NewsItem>;

    fn provider(&self) -> &'static str {
        self.source.name()
    }

    async fn fetch_normalized(&self) -> Result<Vec<NewsItem>, SourceError> {
        let body = self
            .fetcher
            .get_text(&self.url, ACCEPT_FEED)
            .await
            .map_err(|e| SourceError::fetch(self.provider(), e))?;

        let items = parse_feed(self.source, &body)?;
        info!(provider = self.provider(), count = items.len(), "Fetched RSS feed");
        Ok(items)
    }
}

pub fn parse_feed(source: NewsSource, body: &str) -> Result<Vec<NewsItem>, SourceError> {
    let channel = Channel::read_from(body.as_bytes())
        .map_err(|e| SourceError::shape(source.name(), e.to_string()))?;

    Ok(channel
        .items()
        .iter()
        .filter_map(|item| normalize_item(source, item))
        .collect())
}

fn normalize_item(source: NewsSource, item: &rss::Item) -> Option<NewsItem> {
    let url = item.link().unwrap_or_default().trim().to_string();
    let id = item
        .guid()
        .map(|guid| guid.value().trim())
        .filter(|guid| !guid.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| url.clone());

    if id.is_empty() {
        debug!(provider = source.name(), "Dropping item with neither guid nor link");
        return None;
    }

    let html = item.content().or(item.description()).unwrap_or_default();
    let image_src = item
        .content()
        .and_then(images::extract_first_image)
        .or_else(|| item.description().and_then(images::extract_first_image));

    Some(NewsItem {
        id,
        title: item.title().unwrap_or_default().trim().to_string(),
        description: images::strip_html(html),
        source,
        published_at: item.pub_date().and_then(parse_feed_date),
        image_url: images::resolve_image(source, image_src, &url),
        url,
        category: "Crypto".to_string(),
        tags: Vec::new(),
    })
}

/// RSS dates are RFC 2822; some feeds emit RFC 3339 instead.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
