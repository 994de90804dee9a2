//! Liquidity range prediction
//!
//! A validated AI prediction is used as-is. Otherwise the range is derived
//! from ATR volatility skewed by the RSI regime, and confidence counts how
//! many independent checks corroborate each other.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::model::{
    IndicatorKind, NewsAnalysis, Prediction, PredictionSource, TechnicalAnalysis,
};

/// Volatility assumed when ATR is missing or unusable
const DEFAULT_VOLATILITY: f64 = 0.02;
const SKEW: f64 = 0.5;

const BASE_CONFIDENCE: f64 = 75.0;
const CHECK_BONUS: f64 = 5.0;
const MIN_CONFIDENCE: f64 = 60.0;
const MAX_CONFIDENCE: f64 = 95.0;

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;
const RSI_MIDPOINT: f64 = 50.0;

/// Smallest width a repaired range may have
const MIN_WIDTH: f64 = 1e-8;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiPrediction {
    range_low: f64,
    range_high: f64,
    confidence: f64,
    #[serde(default)]
    explanation: Option<String>,
}

fn parse_prediction(raw: &Value) -> Result<AiPrediction> {
    let payload: AiPrediction = serde_json::from_value(raw.clone())
        .map_err(|e| EngineError::AiValidation(format!("prediction payload: {e}")))?;

    if !payload.range_low.is_finite() || payload.range_low <= 0.0 {
        return Err(EngineError::AiValidation(format!(
            "rangeLow = {} must be positive",
            payload.range_low
        )));
    }
    if !payload.range_high.is_finite() || payload.range_high <= payload.range_low {
        return Err(EngineError::AiValidation(format!(
            "rangeHigh = {} must exceed rangeLow {}",
            payload.range_high, payload.range_low
        )));
    }
    if !payload.confidence.is_finite() || !(0.0..=100.0).contains(&payload.confidence) {
        return Err(EngineError::AiValidation(format!(
            "confidence = {} outside [0, 100]",
            payload.confidence
        )));
    }

    Ok(payload)
}

fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Order a range and give it a non-zero width
fn repair_range(low: f64, high: f64, price: f64) -> (f64, f64) {
    let (low, high) = if low > high { (high, low) } else { (low, high) };
    if high > low {
        return (low.max(0.0), high);
    }
    let pad = if price.is_finite() && price > 0.0 {
        price * 0.01
    } else {
        MIN_WIDTH
    };
    ((low - pad).max(0.0), high + pad)
}

/// Builds the final range prediction
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionSynthesizer;

impl PredictionSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// AI prediction when it validates, deterministic fallback otherwise
    pub fn synthesize(
        &self,
        price: f64,
        technical: &TechnicalAnalysis,
        news: &NewsAnalysis,
        ai_raw: Option<&Value>,
    ) -> Prediction {
        if let Some(raw) = ai_raw {
            match parse_prediction(raw) {
                Ok(ai) => {
                    debug!(low = ai.range_low, high = ai.range_high, "Using AI prediction");
                    let (range_low, range_high) = repair_range(ai.range_low, ai.range_high, price);
                    return Prediction {
                        range_low,
                        range_high,
                        confidence: ai.confidence,
                        timestamp: Utc::now(),
                        explanation: ai.explanation.filter(|e| !e.trim().is_empty()),
                        source: PredictionSource::Ai,
                    };
                }
                Err(e) => warn!(error = %e, "Discarding AI prediction"),
            }
        }
        self.fallback(price, technical, news)
    }

    /// Deterministic prediction from indicators and news
    pub fn fallback(
        &self,
        price: f64,
        technical: &TechnicalAnalysis,
        news: &NewsAnalysis,
    ) -> Prediction {
        if !price.is_finite() || price <= 0.0 {
            return Prediction {
                range_low: MIN_WIDTH,
                range_high: 2.0 * MIN_WIDTH,
                confidence: MIN_CONFIDENCE,
                timestamp: Utc::now(),
                explanation: Some("No usable price".to_string()),
                source: PredictionSource::Fallback,
            };
        }

        let volatility = technical
            .value_of(IndicatorKind::Atr)
            .map(|atr| atr / price)
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(DEFAULT_VOLATILITY);

        let rsi = technical
            .value_of(IndicatorKind::Rsi)
            .unwrap_or(RSI_MIDPOINT);
        let sentiment_sign: i8 = if rsi > RSI_OVERBOUGHT {
            -1
        } else if rsi < RSI_OVERSOLD {
            1
        } else {
            0
        };
        let skew = f64::from(sentiment_sign) * SKEW;

        let low = price * (1.0 - volatility * (1.0 + skew));
        let high = price * (1.0 + volatility * (1.0 - skew));
        let (range_low, range_high) = repair_range(low, high, price);

        let ema = technical.value_of(IndicatorKind::Ema).unwrap_or(price);
        let macd_sign = sign(technical.value_of(IndicatorKind::Macd).unwrap_or(0.0));

        let checks = [
            sign(price - ema) == macd_sign,
            macd_sign == sentiment_sign,
            sign(rsi - RSI_MIDPOINT) == sentiment_sign,
            news.sentiment.direction() == sign(technical.overall_sentiment),
        ];
        let agreeing = checks.iter().filter(|c| **c).count();
        let confidence =
            (BASE_CONFIDENCE + CHECK_BONUS * agreeing as f64).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

        debug!(volatility, sentiment_sign, agreeing, "Fallback prediction");

        Prediction {
            range_low,
            range_high,
            confidence,
            timestamp: Utc::now(),
            explanation: Some(format!(
                "ATR volatility {:.2}%, RSI {:.1}, {agreeing}/4 signals agree",
                volatility * 100.0,
                rsi
            )),
            source: PredictionSource::Fallback,
        }
    }
}
