use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

use crate::models::news::NewsSource;

static IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<img[^>]+src="([^">]+)""#).expect("valid img regex"));

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// First `<img src="...">` reference in an HTML fragment.
pub fn extract_first_image(html: &str) -> Option<&str> {
    IMG_SRC
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Absolute image URL for an article, or the source's placeholder.
/// Relative references are resolved against the article link.
pub fn resolve_image(source: NewsSource, src: Option<&str>, article_url: &str) -> String {
    let Some(src) = src.map(str::trim).filter(|s| !s.is_empty()) else {
        return source.default_image().to_string();
    };

    let resolved =
        Url::parse(src).or_else(|_| Url::parse(article_url).and_then(|base| base.join(src)));

    match resolved {
        Ok(url) if matches!(url.scheme(), "http" | "https") => with_size_hint(source, url),
        _ => source.default_image().to_string(),
    }
}

fn with_size_hint(source: NewsSource, url: Url) -> String {
    let hint = match source {
        NewsSource::CoinTelegraph => "format=webp&width=720",
        NewsSource::BitcoinCom => "w=720&q=75",
        NewsSource::CryptoCompare | NewsSource::ZyCrypto => return url.to_string(),
    };
    let separator = if url.query().is_some() { '&' } else { '?' };
    format!("{url}{separator}{hint}")
}

/// Plain-text snippet of an HTML fragment.
pub fn strip_html(html: &str) -> String {
    let text = TAG.replace_all(html, " ");
    let text = htmlescape::decode_html(&text).unwrap_or_else(|_| text.into_owned());
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_img_src() {
        let html = r#"<p>intro</p><img class="x" src="https://cdn.example.com/a.jpg" alt="a"><img src="b.jpg">"#;
        assert_eq!(extract_first_image(html), Some("https://cdn.example.com/a.jpg"));
        assert_eq!(extract_first_image("<p>no images</p>"), None);
    }

    #[test]
    fn missing_image_uses_source_placeholder() {
        assert_eq!(
            resolve_image(NewsSource::ZyCrypto, None, "https://zycrypto.com/x"),
            "/images/zycrypto-default.png"
        );
        assert_eq!(
            resolve_image(NewsSource::ZyCrypto, Some("  "), "https://zycrypto.com/x"),
            "/images/zycrypto-default.png"
        );
    }

    #[test]
    fn relative_images_resolve_against_article() {
        assert_eq!(
            resolve_image(
                NewsSource::ZyCrypto,
                Some("/wp-content/uploads/btc.png"),
                "https://zycrypto.com/2024/05/story/"
            ),
            "https://zycrypto.com/wp-content/uploads/btc.png"
        );
    }

    #[test]
    fn unresolvable_images_use_placeholder() {
        assert_eq!(
            resolve_image(NewsSource::BitcoinCom, Some("img.png"), ""),
            "/images/bitcoin-default.png"
        );
        assert_eq!(
            resolve_image(NewsSource::BitcoinCom, Some("data:image/png;base64,AAAA"), ""),
            "/images/bitcoin-default.png"
        );
    }

    #[test]
    fn size_hints_per_source() {
        let cointelegraph = Some("https://images.cointelegraph.com/a.jpg");
        assert_eq!(
            resolve_image(NewsSource::CoinTelegraph, cointelegraph, ""),
            "https://images.cointelegraph.com/a.jpg?format=webp&width=720"
        );
        let bitcoin_com = Some("https://static.news.bitcoin.com/a.jpg?v=2");
        assert_eq!(
            resolve_image(NewsSource::BitcoinCom, bitcoin_com, ""),
            "https://static.news.bitcoin.com/a.jpg?v=2&w=720&q=75"
        );
    }

    #[test]
    fn strips_markup_and_entities() {
        assert_eq!(
            strip_html("<p>Bitcoin&nbsp;hits <b>$100k</b> &amp; more</p>\n<p>again</p>"),
            "Bitcoin hits $100k & more again"
        );
    }

    #[test]
    fn decodes_numeric_and_named_entities() {
        assert_eq!(
            strip_html("<p>Bitcoin rallies again [&#8230;]</p> &hellip; &#038; &rsquo;"),
            "Bitcoin rallies again [\u{2026}] \u{2026} & \u{2019}"
        );
        assert_eq!(strip_html("Fed&#8217;s &quot;pivot&quot;"), "Fed\u{2019}s \"pivot\"");
    }

    #[test]
    fn malformed_entities_keep_the_text() {
        assert_eq!(strip_html("<b>Q&A</b> session"), "Q&A session");
    }
}
