//! Finnhub crypto news client

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{EngineError, Result};
use crate::model::HeadlineItem;
use crate::sources::NewsSource;

const TOKEN_HEADER: &str = "X-Finnhub-Token";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const SOURCE: &str = "finnhub";
const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1/";

/// Finnhub news article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinnhubNewsArticle {
    /// Publish time (UNIX timestamp)
    #[serde(default)]
    pub datetime: i64,
    /// News headline
    pub headline: String,
    /// News source
    #[serde(default)]
    pub source: String,
    /// Article URL
    #[serde(default)]
    pub url: String,
}

/// Newest non-empty headlines first, at most `limit`
pub fn to_headlines(mut articles: Vec<FinnhubNewsArticle>, limit: usize) -> Vec<HeadlineItem> {
    articles.sort_by(|a, b| b.datetime.cmp(&a.datetime));
    articles
        .into_iter()
        .filter(|a| !a.headline.trim().is_empty())
        .take(limit)
        .map(|a| HeadlineItem::new(a.headline.trim(), a.url))
        .collect()
}

/// Finnhub client for market news
pub struct FinnhubClient {
    client: Client,
    base_url: Url,
    api_key: String,
    max_headlines: usize,
    rate_limiter: SharedRateLimiter,
}

impl FinnhubClient {
    /// Create a new Finnhub client with rate limiting
    ///
    /// # Arguments
    /// * `api_key` - Finnhub API key
    /// * `rate_limit` - Requests per minute (free tier: 60, premium: 300+)
    /// * `timeout` - Request timeout
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| EngineError::Config(format!("invalid Finnhub URL: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
            max_headlines: 20,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Cap the number of headlines returned per fetch
    pub fn with_max_headlines(mut self, max_headlines: usize) -> Self {
        self.max_headlines = max_headlines;
        self
    }

    fn news_url(&self, category: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join("news")
            .map_err(|e| EngineError::Config(format!("invalid Finnhub URL: {e}")))?;
        url.query_pairs_mut().append_pair("category", category);
        Ok(url)
    }

    /// News request authenticated through the token header
    fn news_request(&self, category: &str) -> Result<RequestBuilder> {
        Ok(self
            .client
            .get(self.news_url(category)?)
            .header(TOKEN_HEADER, &self.api_key))
    }

    /// Get general market news
    ///
    /// # Arguments
    /// * `category` - News category (general, forex, crypto, merger)
    #[instrument(skip(self))]
    pub async fn get_market_news(&self, category: &str) -> Result<Vec<FinnhubNewsArticle>> {
        self.rate_limiter.until_ready().await;

        let response = self
            .news_request(category)?
            .send()
            .await
            .map_err(|e| {
                EngineError::upstream(SOURCE, format!("request failed: {}", e.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::upstream(SOURCE, format!("HTTP {status}: {body}")));
        }

        let articles = response
            .json::<Vec<FinnhubNewsArticle>>()
            .await
            .map_err(|e| {
                EngineError::upstream(SOURCE, format!("invalid response: {}", e.without_url()))
            })?;

        debug!(count = articles.len(), "Fetched news");
        Ok(articles)
    }
}

#[async_trait]
impl NewsSource for FinnhubClient {
    async fn fetch(&self) -> Result<Vec<HeadlineItem>> {
        let articles = self.get_market_news("crypto").await?;
        Ok(to_headlines(articles, self.max_headlines))
    }

    fn name(&self) -> &str {
        SOURCE
    }
}
