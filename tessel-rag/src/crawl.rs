//! Single-page fetch for LINK ingestion.
//!
//! Fetches one URL, extracts the page title, and converts the body to plain
//! text. Crawling beyond one page is the caller's concern.

use std::time::Duration;

use scraper::{Html, Selector};
use url::Url;

use crate::errors::{RagError, RagResult};

/// A fetched page reduced to plain text.
#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub url: String,
    pub title: String,
    pub text: String,
}

/// Fetch `url` and return its title and text content.
pub async fn fetch_page(url: &str) -> RagResult<CrawledPage> {
    let parsed = Url::parse(url)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RagError::Validation(format!(
            "unsupported url scheme: {}",
            parsed.scheme()
        )));
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let response = client
        .get(parsed.clone())
        .header("User-Agent", "tessel-rag/0.1")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(RagError::ExtractionFailed(format!(
            "HTTP {status} for {url}"
        )));
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = response.text().await?;

    if content_type.contains("text/html") || content_type.contains("application/xhtml") {
        let title = extract_title(&body)
            .or_else(|| parsed.host_str().map(str::to_string))
            .unwrap_or_else(|| url.to_string());
        let text = html2text::from_read(body.as_bytes(), 80);
        return Ok(CrawledPage {
            url: url.to_string(),
            title,
            text,
        });
    }

    if content_type.contains("text/plain") || content_type.is_empty() {
        let title = parsed
            .host_str()
            .map(str::to_string)
            .unwrap_or_else(|| url.to_string());
        return Ok(CrawledPage {
            url: url.to_string(),
            title,
            text: body,
        });
    }

    Err(RagError::UnsupportedFormat(format!(
        "unsupported content type {content_type} for {url}"
    )))
}

fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    if title.is_empty() { None } else { Some(title) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_page_title() {
        let html = "<html><head><title> Pricing — Example </title></head><body>hi</body></html>";
        assert_eq!(extract_title(html), Some("Pricing — Example".to_string()));
    }

    #[test]
    fn missing_title_yields_none() {
        assert_eq!(extract_title("<html><body>no title</body></html>"), None);
    }
}
