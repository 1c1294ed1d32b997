//! External search provider client
//!
//! Fetches topic search results from the NewsAPI "everything" endpoint. The
//! provider is rate limited and paid, which is why the resolver only reaches
//! for it when the persistent store cannot cover a request.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::task::ResultItem;

/// Default NewsAPI endpoint
const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";

/// Outbound request timeout
const HTTP_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur when fetching from the external provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP transport or body decoding failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status field
    #[error("provider returned status \"{0}\"")]
    Status(String),
}

/// Source of fresh search results, called at most once per task
///
/// Abstracted behind a trait so the resolver holds `Arc<dyn SearchProvider>`
/// and tests can count and script calls.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Fetches up to `max_items` results for `topic` no older than `days`
    /// days; items beyond `max_items` are discarded
    async fn fetch(
        &self,
        topic: &str,
        days: u32,
        max_items: u32,
    ) -> Result<Vec<ResultItem>, ProviderError>;
}

/// Response body of the NewsAPI "everything" endpoint
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    articles: Vec<Article>,
}

/// A single article from the API
#[derive(Debug, Deserialize)]
struct Article {
    title: String,
    url: String,
}

/// Client for the NewsAPI
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// API key sent with every request
    api_key: String,
    /// Base URL for the API (allows override for testing)
    base_url: String,
}

impl NewsApiClient {
    /// Creates a new client with the default endpoint
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, NEWSAPI_URL.to_string())
    }

    /// Creates a new client with a custom base URL (for testing)
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http_client,
            api_key,
            base_url,
        }
    }

    /// Earliest publish date for a recency window ending today
    ///
    /// A window of 1 day means "today only", so the from-date is
    /// now − (days − 1), formatted as YYYY-MM-DD.
    fn from_date(days: u32) -> String {
        let from = Utc::now() - Duration::days(i64::from(days) - 1);
        from.format("%Y-%m-%d").to_string()
    }

    /// Converts a decoded API response into result items, capped at
    /// `max_items`
    fn into_items(response: ApiResponse, max_items: u32) -> Result<Vec<ResultItem>, ProviderError> {
        if response.status != "ok" {
            return Err(ProviderError::Status(response.status));
        }
        Ok(response
            .articles
            .into_iter()
            .take(max_items as usize)
            .map(|a| ResultItem {
                title: a.title,
                url: a.url,
            })
            .collect())
    }
}

#[async_trait]
impl SearchProvider for NewsApiClient {
    async fn fetch(
        &self,
        topic: &str,
        days: u32,
        max_items: u32,
    ) -> Result<Vec<ResultItem>, ProviderError> {
        let from = Self::from_date(days);
        let page_size = max_items.to_string();
        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("q", topic),
                ("from", from.as_str()),
                ("pageSize", page_size.as_str()),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?
            .json::<ApiResponse>()
            .await?;

        Self::into_items(response, max_items)
    }
}
