//! Configuration for the analysis engine

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for analysis and prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// CoinGecko coin id of the traded asset
    pub coin_id: String,

    /// Quote currency
    pub vs_currency: String,

    /// Freshness of a market snapshot
    pub cache_ttl_snapshot: Duration,

    /// Freshness of the headline list
    pub cache_ttl_headlines: Duration,

    /// Freshness of the technical report
    pub cache_ttl_technical: Duration,

    /// Freshness of the sentiment report
    pub cache_ttl_sentiment: Duration,

    /// Freshness of the prediction
    pub cache_ttl_prediction: Duration,

    /// How long expired entries stay available as a fallback
    pub cache_retention: Duration,

    /// Upper bound on a single AI call
    pub ai_timeout: Duration,

    /// HTTP request timeout for data sources
    pub request_timeout: Duration,

    /// Market data requests per minute
    pub market_rate_limit: u32,

    /// News requests per minute
    pub news_rate_limit: u32,

    /// Headlines kept per fetch
    pub max_headlines: usize,

    /// Full-range RSI
    pub strict_rsi: bool,

    /// Finnhub API key (optional, news is empty without it)
    pub finnhub_api_key: Option<String>,

    /// CoinGecko demo API key (optional)
    pub coingecko_api_key: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coin_id: "ethereum".to_string(),
            vs_currency: "usd".to_string(),
            cache_ttl_snapshot: Duration::from_secs(30),
            cache_ttl_headlines: Duration::from_secs(900),  // 15 minutes
            cache_ttl_technical: Duration::from_secs(60),
            cache_ttl_sentiment: Duration::from_secs(900),  // 15 minutes
            cache_ttl_prediction: Duration::from_secs(60),
            cache_retention: Duration::from_secs(3600),     // 1 hour
            ai_timeout: Duration::from_secs(20),
            request_timeout: Duration::from_secs(10),
            market_rate_limit: 30,
            news_rate_limit: 60,
            max_headlines: 20,
            strict_rsi: false,
            finnhub_api_key: None,
            coingecko_api_key: None,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| EngineError::Config(format!("{name}={raw} is not a valid value")))
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(EngineError::Config(format!("{name}={raw} is not a boolean"))),
    }
}

impl EngineConfig {
    /// Create a new configuration builder
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Defaults overridden by `LIQ_*`, `FINNHUB_API_KEY` and `COINGECKO_API_KEY`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(coin) = lookup("LIQ_COIN_ID").filter(|v| !v.trim().is_empty()) {
            config.coin_id = coin.trim().to_lowercase();
        }
        if let Some(vs) = lookup("LIQ_VS_CURRENCY").filter(|v| !v.trim().is_empty()) {
            config.vs_currency = vs.trim().to_lowercase();
        }
        if let Some(raw) = lookup("LIQ_AI_TIMEOUT_SECS") {
            config.ai_timeout = Duration::from_secs(parse_env("LIQ_AI_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("LIQ_STRICT_RSI") {
            config.strict_rsi = parse_flag("LIQ_STRICT_RSI", &raw)?;
        }
        config.finnhub_api_key = lookup("FINNHUB_API_KEY").filter(|k| !k.is_empty());
        config.coingecko_api_key = lookup("COINGECKO_API_KEY").filter(|k| !k.is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.coin_id.is_empty() || self.vs_currency.is_empty() {
            return Err(EngineError::Config(
                "coin_id and vs_currency must not be empty".to_string(),
            ));
        }

        let ttls = [
            ("snapshot", self.cache_ttl_snapshot),
            ("headlines", self.cache_ttl_headlines),
            ("technical", self.cache_ttl_technical),
            ("sentiment", self.cache_ttl_sentiment),
            ("prediction", self.cache_ttl_prediction),
        ];
        for (name, ttl) in ttls {
            if ttl > self.cache_retention {
                return Err(EngineError::Config(format!(
                    "{name} TTL {ttl:?} exceeds cache retention {:?}",
                    self.cache_retention
                )));
            }
        }

        if self.ai_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(EngineError::Config(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        if self.market_rate_limit == 0 || self.news_rate_limit == 0 {
            return Err(EngineError::Config(
                "rate limits must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Cache key prefix for the configured pair
    pub fn pair_key(&self) -> String {
        format!("{}:{}", self.coin_id, self.vs_currency)
    }
}

/// Builder for EngineConfig
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    coin_id: Option<String>,
    vs_currency: Option<String>,
    cache_ttl_snapshot: Option<Duration>,
    cache_ttl_headlines: Option<Duration>,
    cache_ttl_technical: Option<Duration>,
    cache_ttl_sentiment: Option<Duration>,
    cache_ttl_prediction: Option<Duration>,
    cache_retention: Option<Duration>,
    ai_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    strict_rsi: Option<bool>,
    finnhub_api_key: Option<String>,
    coingecko_api_key: Option<String>,
}

impl EngineConfigBuilder {
    /// Set the traded coin and quote currency
    pub fn pair(mut self, coin_id: impl Into<String>, vs_currency: impl Into<String>) -> Self {
        self.coin_id = Some(coin_id.into());
        self.vs_currency = Some(vs_currency.into());
        self
    }

    pub fn cache_ttl_snapshot(mut self, duration: Duration) -> Self {
        self.cache_ttl_snapshot = Some(duration);
        self
    }

    pub fn cache_ttl_headlines(mut self, duration: Duration) -> Self {
        self.cache_ttl_headlines = Some(duration);
        self
    }

    pub fn cache_ttl_technical(mut self, duration: Duration) -> Self {
        self.cache_ttl_technical = Some(duration);
        self
    }

    pub fn cache_ttl_sentiment(mut self, duration: Duration) -> Self {
        self.cache_ttl_sentiment = Some(duration);
        self
    }

    pub fn cache_ttl_prediction(mut self, duration: Duration) -> Self {
        self.cache_ttl_prediction = Some(duration);
        self
    }

    /// Set how long expired entries are kept for fallback
    pub fn cache_retention(mut self, duration: Duration) -> Self {
        self.cache_retention = Some(duration);
        self
    }

    /// Set AI call timeout
    pub fn ai_timeout(mut self, duration: Duration) -> Self {
        self.ai_timeout = Some(duration);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    pub fn strict_rsi(mut self, strict: bool) -> Self {
        self.strict_rsi = Some(strict);
        self
    }

    /// Set Finnhub API key
    pub fn finnhub_api_key(mut self, key: impl Into<String>) -> Self {
        self.finnhub_api_key = Some(key.into());
        self
    }

    /// Set CoinGecko API key
    pub fn coingecko_api_key(mut self, key: impl Into<String>) -> Self {
        self.coingecko_api_key = Some(key.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<EngineConfig> {
        let defaults = EngineConfig::default();

        let config = EngineConfig {
            coin_id: self.coin_id.unwrap_or(defaults.coin_id),
            vs_currency: self.vs_currency.unwrap_or(defaults.vs_currency),
            cache_ttl_snapshot: self.cache_ttl_snapshot.unwrap_or(defaults.cache_ttl_snapshot),
            cache_ttl_headlines: self.cache_ttl_headlines.unwrap_or(defaults.cache_ttl_headlines),
            cache_ttl_technical: self.cache_ttl_technical.unwrap_or(defaults.cache_ttl_technical),
            cache_ttl_sentiment: self.cache_ttl_sentiment.unwrap_or(defaults.cache_ttl_sentiment),
            cache_ttl_prediction: self
                .cache_ttl_prediction
                .unwrap_or(defaults.cache_ttl_prediction),
            cache_retention: self.cache_retention.unwrap_or(defaults.cache_retention),
            ai_timeout: self.ai_timeout.unwrap_or(defaults.ai_timeout),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            strict_rsi: self.strict_rsi.unwrap_or(defaults.strict_rsi),
            finnhub_api_key: self.finnhub_api_key,
            coingecko_api_key: self.coingecko_api_key,
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.coin_id, "ethereum");
        assert_eq!(config.cache_ttl_snapshot, Duration::from_secs(30));
        assert_eq!(config.cache_ttl_sentiment, Duration::from_secs(900));
        assert!(!config.strict_rsi);
        assert!(config.validate().is_ok());
        assert_eq!(config.pair_key(), "ethereum:usd");
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::builder()
            .pair("bitcoin", "eur")
            .cache_ttl_technical(Duration::from_secs(5))
            .strict_rsi(true)
            .build()
            .unwrap();

        assert_eq!(config.pair_key(), "bitcoin:eur");
        assert_eq!(config.cache_ttl_technical, Duration::from_secs(5));
        assert!(config.strict_rsi);
    }

    #[test]
    fn test_ttl_beyond_retention_rejected() {
        let result = EngineConfig::builder()
            .cache_retention(Duration::from_secs(60))
            .build();
        assert!(matches!(result, Err(EngineError::Config(msg)) if msg.contains("headlines")));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = EngineConfig {
            ai_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("LIQ_COIN_ID", " Solana "),
            ("LIQ_AI_TIMEOUT_SECS", "5"),
            ("LIQ_STRICT_RSI", "true"),
            ("FINNHUB_API_KEY", "key"),
            ("COINGECKO_API_KEY", ""),
        ]))
        .unwrap();

        assert_eq!(config.coin_id, "solana");
        assert_eq!(config.vs_currency, "usd");
        assert_eq!(config.ai_timeout, Duration::from_secs(5));
        assert!(config.strict_rsi);
        assert_eq!(config.finnhub_api_key.as_deref(), Some("key"));
        assert_eq!(config.coingecko_api_key, None);
    }

    #[test]
    fn test_from_lookup_invalid_values() {
        assert!(EngineConfig::from_lookup(lookup(&[("LIQ_AI_TIMEOUT_SECS", "soon")])).is_err());
        assert!(EngineConfig::from_lookup(lookup(&[("LIQ_STRICT_RSI", "maybe")])).is_err());
        assert!(EngineConfig::from_lookup(lookup(&[("LIQ_AI_TIMEOUT_SECS", "0")])).is_err());
    }
}
