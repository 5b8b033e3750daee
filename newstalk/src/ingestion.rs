use anyhow::{anyhow, Context, Result};
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use url::Url;

use common::FeedConfig;

use crate::error::ApiError;

/// Stored snippets are capped at this many characters.
pub const SNIPPET_CHARS: usize = 200;

/// A single normalized news entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(rename = "pubDate", default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Build the feed query URL for a keyword.
pub fn build_search_url(cfg: &FeedConfig, keyword: &str) -> Result<Url> {
    Url::parse_with_params(
        &cfg.endpoint,
        &[
            ("q", keyword),
            ("hl", cfg.language.as_str()),
            ("gl", cfg.country.as_str()),
            ("ceid", cfg.edition.as_str()),
        ],
    )
    .with_context(|| format!("invalid feed endpoint: {}", cfg.endpoint))
}

/// Fetch up to `cfg.max_items` news entries for a keyword.
///
/// The keyword must be non-empty after trimming; a blank keyword fails
/// before any network I/O. Feed failures are not retried.
pub async fn fetch_news(cfg: &FeedConfig, keyword: &str) -> Result<Vec<NewsItem>, ApiError> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(ApiError::Validation("키워드를 입력해주세요.".to_string()));
    }

    fetch_and_parse(cfg, keyword).await.map_err(ApiError::Collector)
}

async fn fetch_and_parse(cfg: &FeedConfig, keyword: &str) -> Result<Vec<NewsItem>> {
    let url = build_search_url(cfg, keyword)?;

    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.fetch_timeout_seconds))
        .user_agent("Newstalk/0.1.0")
        .build()
        .context("failed to build reqwest client")?;

    let response = client
        .get(url.clone())
        .send()
        .await
        .context("network error during feed fetch")?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("feed fetch failed with status: {}", status));
    }

    let bytes = response.bytes().await.context("failed to read feed body")?;
    let feed = parser::parse(bytes.as_ref()).context("failed to parse feed")?;

    let items: Vec<NewsItem> = feed
        .entries
        .iter()
        .take(cfg.max_items)
        .map(news_item_from_entry)
        .collect();

    info!(keyword, items = items.len(), "feed fetched");
    Ok(items)
}

fn news_item_from_entry(entry: &Entry) -> NewsItem {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.clone())
        .unwrap_or_default();

    // Prefer the direct link; fall back to the entry id (Google News items
    // always carry a guid).
    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_else(|| entry.id.clone());

    let pub_date = entry.published.map(|d| d.to_rfc2822());

    let source = entry
        .authors
        .first()
        .map(|a| a.name.clone())
        .filter(|name| !name.is_empty());

    let snippet = entry
        .summary
        .as_ref()
        .map(|s| truncate_chars(&strip_html(&s.content), SNIPPET_CHARS))
        .filter(|s| !s.is_empty());

    NewsItem {
        title,
        link,
        pub_date,
        source,
        snippet,
    }
}

/// Flatten the HTML markup feed entries embed in their summaries.
fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
