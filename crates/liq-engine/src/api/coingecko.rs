//! CoinGecko market data client

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{EngineError, Result};
use crate::model::MarketSnapshot;
use crate::sources::MarketDataSource;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const SOURCE: &str = "coingecko";
const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3/";

/// Extract a snapshot from a `/simple/price` response body
///
/// Missing volume or change fields are reported as NaN and degrade the
/// affected indicators downstream instead of failing the fetch.
pub fn parse_simple_price(body: &Value, coin_id: &str, vs_currency: &str) -> Result<MarketSnapshot> {
    let quote = body
        .get(coin_id)
        .ok_or_else(|| EngineError::upstream(SOURCE, format!("no quote for {coin_id}")))?;

    let field = |suffix: &str| {
        quote
            .get(format!("{vs_currency}{suffix}"))
            .and_then(Value::as_f64)
    };

    let price = field("").ok_or_else(|| {
        EngineError::upstream(SOURCE, format!("no {vs_currency} price for {coin_id}"))
    })?;

    Ok(MarketSnapshot::new(
        price,
        field("_24h_vol").unwrap_or(f64::NAN),
        field("_24h_change").unwrap_or(f64::NAN),
        field("_market_cap").unwrap_or(0.0),
    ))
}

/// CoinGecko client for spot price, volume and market cap
pub struct CoinGeckoClient {
    client: Client,
    base_url: Url,
    coin_id: String,
    vs_currency: String,
    api_key: Option<String>,
    rate_limiter: SharedRateLimiter,
}

impl CoinGeckoClient {
    /// Create a new CoinGecko client with rate limiting
    ///
    /// # Arguments
    /// * `coin_id` - CoinGecko coin id (e.g., "ethereum")
    /// * `vs_currency` - Quote currency (e.g., "usd")
    /// * `rate_limit` - Requests per minute (public tier: about 30)
    /// * `timeout` - Request timeout
    pub fn new(
        coin_id: impl Into<String>,
        vs_currency: impl Into<String>,
        rate_limit: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| EngineError::Config(format!("invalid CoinGecko URL: {e}")))?;

        Ok(Self {
            client,
            base_url,
            coin_id: coin_id.into(),
            vs_currency: vs_currency.into(),
            api_key: None,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Point the client at another API root (pro tier, proxy)
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let mut url = Url::parse(base_url)
            .map_err(|e| EngineError::Config(format!("invalid CoinGecko URL {base_url}: {e}")))?;
        if !url.path().ends_with('/') {
            url.set_path(&format!("{}/", url.path()));
        }
        self.base_url = url;
        Ok(self)
    }

    /// Send the demo API key with each request
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    fn simple_price_url(&self) -> Result<Url> {
        let mut url = self
            .base_url
            .join("simple/price")
            .map_err(|e| EngineError::Config(format!("invalid CoinGecko URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("ids", &self.coin_id)
            .append_pair("vs_currencies", &self.vs_currency)
            .append_pair("include_market_cap", "true")
            .append_pair("include_24hr_vol", "true")
            .append_pair("include_24hr_change", "true");
        Ok(url)
    }

    /// Get the current quote for the configured pair
    #[instrument(skip(self), fields(coin = %self.coin_id))]
    pub async fn get_snapshot(&self) -> Result<MarketSnapshot> {
        self.rate_limiter.until_ready().await;

        let mut request = self.client.get(self.simple_price_url()?);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EngineError::upstream(SOURCE, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::upstream(SOURCE, format!("HTTP {status}: {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| EngineError::upstream(SOURCE, format!("invalid response: {e}")))?;

        let snapshot = parse_simple_price(&body, &self.coin_id, &self.vs_currency)?;
        debug!(price = snapshot.price, "Fetched snapshot");
        Ok(snapshot)
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoClient {
    async fn fetch(&self) -> Result<MarketSnapshot> {
        self.get_snapshot().await
    }

    fn name(&self) -> &str {
        SOURCE
    }
}
