//! Domain types shared by the analysis pipeline
//!
//! Every type serializes with camelCase field names, which is the shape the
//! web layer consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of indicators produced per snapshot
pub const INDICATOR_COUNT: usize = 8;

/// Substituted for an overall sentiment that would otherwise be exactly zero
pub const SENTIMENT_ZERO_BIAS: f64 = 0.1;

/// Categorical trading inference derived from an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Neutral,
}

impl Signal {
    /// +1 for buy, -1 for sell, 0 for neutral
    pub fn direction(self) -> i8 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
            Self::Neutral => 0,
        }
    }
}

/// Polarity of a headline or a news digest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    /// +1 for positive, -1 for negative, 0 for neutral
    pub fn direction(self) -> i8 {
        match self {
            Self::Positive => 1,
            Self::Negative => -1,
            Self::Neutral => 0,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        };
        f.write_str(s)
    }
}

/// Point-in-time read of price, volume and market cap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    /// Last traded price in the quote currency
    pub price: f64,
    /// 24h traded volume in the quote currency
    pub volume_24h: f64,
    /// 24h price change in percent
    pub price_change_24h: f64,
    /// Market capitalisation in the quote currency, 0 when unknown
    pub market_cap: f64,
}

impl MarketSnapshot {
    pub fn new(price: f64, volume_24h: f64, price_change_24h: f64, market_cap: f64) -> Self {
        Self {
            price,
            volume_24h,
            price_change_24h,
            market_cap,
        }
    }

    /// Price is unusable for indicator math
    pub fn is_degenerate(&self) -> bool {
        !self.price.is_finite() || self.price <= 0.0
    }

    /// Volume is present and non-negative
    pub fn has_volume(&self) -> bool {
        self.volume_24h.is_finite() && self.volume_24h >= 0.0
    }
}

/// The fixed set of indicators, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Ema,
    Macd,
    Rsi,
    StochRsi,
    BollingerBands,
    Atr,
    Fibonacci,
    Vpvr,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; INDICATOR_COUNT] = [
        Self::Ema,
        Self::Macd,
        Self::Rsi,
        Self::StochRsi,
        Self::BollingerBands,
        Self::Atr,
        Self::Fibonacci,
        Self::Vpvr,
    ];

    /// Wire name of the indicator
    pub fn name(self) -> &'static str {
        match self {
            Self::Ema => "EMA",
            Self::Macd => "MACD",
            Self::Rsi => "RSI",
            Self::StochRsi => "StochRSI",
            Self::BollingerBands => "BB",
            Self::Atr => "ATR",
            Self::Fibonacci => "Fibonacci",
            Self::Vpvr => "VPVR",
        }
    }

    /// Case-insensitive lookup by wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// A single technical-analysis metric with its derived signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    pub name: String,
    pub value: f64,
    pub signal: Signal,
    /// Signal strength in [0, 1]
    pub confidence: f64,
    pub description: String,
}

impl Indicator {
    pub fn new(
        kind: IndicatorKind,
        value: f64,
        signal: Signal,
        confidence: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: kind.name().to_string(),
            value,
            signal,
            confidence: confidence.clamp(0.0, 1.0),
            description: description.into(),
        }
    }

    /// Zero-value, zero-confidence placeholder for unusable input
    pub fn degenerate(kind: IndicatorKind, reason: &str) -> Self {
        Self::new(kind, 0.0, Signal::Neutral, 0.0, format!("Unavailable: {reason}"))
    }
}

/// A news headline with its classified sentiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlineItem {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub sentiment: Sentiment,
}

impl HeadlineItem {
    /// Unclassified headline as delivered by a news source
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            sentiment: Sentiment::Neutral,
        }
    }
}

/// Expected price impact of the news flow
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub short_term: f64,
    pub long_term: f64,
}

/// Aggregated view of the news flow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsAnalysis {
    /// 0 = fully negative, 0.5 = balanced, 1 = fully positive
    pub score: f64,
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub impact: Impact,
}

/// Expected trading band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
    pub confidence: f64,
}

/// Indicator set plus the derived sentiment and price band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalAnalysis {
    pub indicators: [Indicator; INDICATOR_COUNT],
    /// In [-1, 1], never exactly 0
    pub overall_sentiment: f64,
    pub price_range: PriceRange,
}

impl TechnicalAnalysis {
    /// Look up an indicator by kind
    pub fn indicator(&self, kind: IndicatorKind) -> Option<&Indicator> {
        self.indicators.iter().find(|i| i.name == kind.name())
    }

    /// Value of an indicator, `None` when missing or unusable
    pub fn value_of(&self, kind: IndicatorKind) -> Option<f64> {
        self.indicator(kind)
            .map(|i| i.value)
            .filter(|v| v.is_finite())
    }
}

/// Clamp into [-1, 1] and replace an exact zero (or NaN) with the bias
pub fn non_zero_sentiment(value: f64) -> f64 {
    if !value.is_finite() || value == 0.0 {
        SENTIMENT_ZERO_BIAS
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Which path produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    Ai,
    Fallback,
}

/// Liquidity range prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub range_low: f64,
    pub range_high: f64,
    /// Percent; [60, 95] on the fallback path, [0, 100] from AI
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub source: PredictionSource,
}

/// Price block of the technical report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price24h {
    pub current: f64,
    /// Absolute change over 24h
    pub change: f64,
    pub change_percentage: f64,
}

/// Volume block of the technical report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume24h {
    pub total: f64,
    pub buy: f64,
    pub sell: f64,
}

/// Produced technical analysis, as served to the web layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalReport {
    pub price_24h: Price24h,
    pub volume_24h: Volume24h,
    pub indicators: [Indicator; INDICATOR_COUNT],
    pub sentiment: f64,
    pub price_range: PriceRange,
}

impl TechnicalReport {
    /// The analysis part of the report
    pub fn analysis(&self) -> TechnicalAnalysis {
        TechnicalAnalysis {
            indicators: self.indicators.clone(),
            overall_sentiment: self.sentiment,
            price_range: self.price_range,
        }
    }
}

/// Headlines and their aggregate score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDigest {
    pub headlines: Vec<HeadlineItem>,
    pub score: f64,
}

/// Produced sentiment view, as served to the web layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentReport {
    pub news: NewsDigest,
    pub analysis: NewsAnalysis,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_names_are_fixed() {
        let names: Vec<_> = IndicatorKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(
            names,
            ["EMA", "MACD", "RSI", "StochRSI", "BB", "ATR", "Fibonacci", "VPVR"]
        );
    }

    #[test]
    fn test_indicator_kind_lookup() {
        assert_eq!(IndicatorKind::from_name("stochrsi"), Some(IndicatorKind::StochRsi));
        assert_eq!(IndicatorKind::from_name(" bb "), Some(IndicatorKind::BollingerBands));
        assert_eq!(IndicatorKind::from_name("OBV"), None);
    }

    #[test]
    fn test_snapshot_field_names() {
        let json = serde_json::to_value(MarketSnapshot::new(2000.0, 1e6, 1.5, 2e11)).unwrap();
        assert_eq!(json["volume24h"], 1e6);
        assert_eq!(json["priceChange24h"], 1.5);
        assert_eq!(json["marketCap"], 2e11);
    }

    #[test]
    fn test_degenerate_snapshot() {
        assert!(MarketSnapshot::new(0.0, 1.0, 0.0, 0.0).is_degenerate());
        assert!(MarketSnapshot::new(f64::NAN, 1.0, 0.0, 0.0).is_degenerate());
        assert!(!MarketSnapshot::new(1.0, f64::NAN, 0.0, 0.0).has_volume());
    }

    #[test]
    fn test_non_zero_sentiment() {
        assert_eq!(non_zero_sentiment(0.0), SENTIMENT_ZERO_BIAS);
        assert_eq!(non_zero_sentiment(f64::NAN), SENTIMENT_ZERO_BIAS);
        assert_eq!(non_zero_sentiment(-3.0), -1.0);
        assert_eq!(non_zero_sentiment(-0.4), -0.4);
    }

    #[test]
    fn test_indicator_confidence_is_clamped() {
        let ind = Indicator::new(IndicatorKind::Rsi, 75.0, Signal::Sell, 1.7, "RSI");
        assert_eq!(ind.confidence, 1.0);
    }

    #[test]
    fn test_headline_sentiment_defaults_to_neutral() {
        let item: HeadlineItem =
            serde_json::from_str(r#"{"title":"t","url":"https://x"}"#).unwrap();
        assert_eq!(item.sentiment, Sentiment::Neutral);
    }
}
