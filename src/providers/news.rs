// =============================================================================
// News Providers (headline retrieval)
// =============================================================================
//
// Two interchangeable strategies behind one capability trait:
//
//   feed   - query the news endpoint by ticker symbol. Cheap, always
//            available, occasionally misses coverage for small caps.
//   search - query by company display name (falling back to the ticker when
//            the name is unknown). Broader recall, noisier matches.
//
// Failure contract: a provider error never fails a dashboard render. The
// caller logs it and shows an empty headline list.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

const NEWS_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// One dashboard headline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Publication date as "YYYY-MM-DD", when the feed carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
}

/// What to look up headlines for.
#[derive(Debug, Clone)]
pub struct NewsQuery {
    pub symbol: String,
    /// Company display name from the chart metadata, when known.
    pub display_name: Option<String>,
}

/// Which headline strategy the dashboard uses. Switchable at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsMode {
    #[default]
    Feed,
    Search,
}

impl fmt::Display for NewsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewsMode::Feed => f.write_str("feed"),
            NewsMode::Search => f.write_str("search"),
        }
    }
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Short name used in logs and API responses.
    fn name(&self) -> &'static str;

    /// Fetch up to `limit` recent headlines, newest first.
    async fn fetch(&self, query: &NewsQuery, limit: usize) -> Result<Vec<NewsItem>>;
}

/// Build the provider for `mode`.
pub fn provider_for(mode: NewsMode) -> Arc<dyn NewsProvider> {
    match mode {
        NewsMode::Feed => Arc::new(TickerNewsFeed::new()),
        NewsMode::Search => Arc::new(HeadlineSearch::new()),
    }
}

// --- wire format -------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNewsItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNewsItem {
    title: Option<String>,
    link: Option<String>,
    publisher: Option<String>,
    provider_publish_time: Option<i64>,
}

fn build_search_url(base: &str, query: &str, limit: usize) -> String {
    format!(
        "{}/v1/finance/search?q={}&quotesCount=0&newsCount={}",
        base,
        urlencoding::encode(query),
        limit
    )
}

fn format_epoch_date(secs: i64) -> Option<String> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Keep items that have both a title and a link, cap at `limit`.
fn collect_items(response: SearchResponse, limit: usize) -> Vec<NewsItem> {
    response
        .news
        .into_iter()
        .filter_map(|item| {
            let title = item.title?;
            let link = item.link?;
            Some(NewsItem {
                title,
                link,
                publisher: item.publisher,
                published: item.provider_publish_time.and_then(format_epoch_date),
            })
        })
        .take(limit)
        .collect()
}

async fn fetch_headlines(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
    limit: usize,
) -> Result<Vec<NewsItem>> {
    let url = build_search_url(base_url, query, limit);
    debug!(query, limit, "Fetching headlines");

    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("News request for '{}' failed", query))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("News API error {}: {}", status, body);
    }

    let parsed: SearchResponse = response
        .json()
        .await
        .context("Failed to parse news response")?;
    Ok(collect_items(parsed, limit))
}

// --- feed strategy -----------------------------------------------------------

/// Headlines keyed by ticker symbol.
pub struct TickerNewsFeed {
    client: reqwest::Client,
    base_url: String,
}

impl TickerNewsFeed {
    pub fn new() -> Self {
        Self {
            client: super::http_client(),
            base_url: NEWS_BASE_URL.to_string(),
        }
    }
}

impl Default for TickerNewsFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsProvider for TickerNewsFeed {
    fn name(&self) -> &'static str {
        "feed"
    }

    async fn fetch(&self, query: &NewsQuery, limit: usize) -> Result<Vec<NewsItem>> {
        fetch_headlines(&self.client, &self.base_url, &query.symbol, limit).await
    }
}

// --- search strategy ---------------------------------------------------------

/// Headlines searched by company display name.
pub struct HeadlineSearch {
    client: reqwest::Client,
    base_url: String,
}

impl HeadlineSearch {
    pub fn new() -> Self {
        Self {
            client: super::http_client(),
            base_url: NEWS_BASE_URL.to_string(),
        }
    }
}

impl Default for HeadlineSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsProvider for HeadlineSearch {
    fn name(&self) -> &'static str {
        "search"
    }

    async fn fetch(&self, query: &NewsQuery, limit: usize) -> Result<Vec<NewsItem>> {
        let term = query.display_name.as_deref().unwrap_or(&query.symbol);
        fetch_headlines(&self.client, &self.base_url, term, limit).await
    }
}
