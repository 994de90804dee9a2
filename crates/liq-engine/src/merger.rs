//! Validation and merge of AI analyses
//!
//! The AI provider returns loosely shaped JSON. It is parsed into strict,
//! typed payloads and range-checked; any violation discards the AI result
//! as a whole and the deterministic result is used unchanged.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::model::{
    Impact, NewsAnalysis, PriceRange, Sentiment, Signal, TechnicalAnalysis, non_zero_sentiment,
};
use crate::sentiment::sentiment_from_score;

/// Lowest confidence a merged field may carry
pub const MIN_CONFIDENCE: f64 = 0.01;

/// AI range bounds never sit inside this band around price
const RANGE_FLOOR_LOW: f64 = 0.95;
const RANGE_FLOOR_HIGH: f64 = 1.05;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiTechnicalPayload {
    #[serde(default)]
    indicators: Vec<AiIndicator>,
    overall_sentiment: f64,
    price_range: AiPriceRange,
}

#[derive(Debug, Deserialize)]
struct AiIndicator {
    name: String,
    #[serde(default)]
    value: Option<f64>,
    // Parsed so that an unknown signal value rejects the payload
    #[serde(default)]
    #[allow(dead_code)]
    signal: Option<Signal>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AiPriceRange {
    low: f64,
    high: f64,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiNewsPayload {
    score: f64,
    sentiment: Sentiment,
    confidence: f64,
    impact: AiImpact,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiImpact {
    short_term: f64,
    long_term: f64,
}

fn unit_interval(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::AiValidation(format!(
            "{field} = {value} outside [0, 1]"
        )))
    }
}

fn parse_technical(raw: &Value) -> Result<AiTechnicalPayload> {
    let payload: AiTechnicalPayload = serde_json::from_value(raw.clone())
        .map_err(|e| EngineError::AiValidation(format!("technical payload: {e}")))?;

    let sentiment = payload.overall_sentiment;
    if !sentiment.is_finite() || !(-1.0..=1.0).contains(&sentiment) {
        return Err(EngineError::AiValidation(format!(
            "overallSentiment = {sentiment} outside [-1, 1]"
        )));
    }

    let range = &payload.price_range;
    if !range.low.is_finite() || range.low <= 0.0 {
        return Err(EngineError::AiValidation(format!(
            "priceRange.low = {} must be positive",
            range.low
        )));
    }
    if !range.high.is_finite() || range.high <= range.low {
        return Err(EngineError::AiValidation(format!(
            "priceRange.high = {} must exceed low {}",
            range.high, range.low
        )));
    }
    unit_interval("priceRange.confidence", range.confidence)?;

    for indicator in &payload.indicators {
        if let Some(confidence) = indicator.confidence {
            unit_interval(&format!("{}.confidence", indicator.name), confidence)?;
        }
        if indicator.value.is_some_and(|v| !v.is_finite()) {
            return Err(EngineError::AiValidation(format!(
                "{}.value is not finite",
                indicator.name
            )));
        }
    }

    Ok(payload)
}

fn parse_news(raw: &Value) -> Result<AiNewsPayload> {
    let payload: AiNewsPayload = serde_json::from_value(raw.clone())
        .map_err(|e| EngineError::AiValidation(format!("news payload: {e}")))?;

    unit_interval("score", payload.score)?;
    unit_interval("confidence", payload.confidence)?;
    unit_interval("impact.shortTerm", payload.impact.short_term)?;
    unit_interval("impact.longTerm", payload.impact.long_term)?;

    Ok(payload)
}

/// Merges validated AI output into deterministic results
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisMerger;

impl AnalysisMerger {
    pub fn new() -> Self {
        Self
    }

    /// Merge an AI technical analysis into the deterministic one
    ///
    /// Values and signals always come from the deterministic side. AI may
    /// refine confidences and descriptions, and may only widen the price
    /// range, never narrow it inside `price * [0.95, 1.05]`.
    pub fn merge_technical(
        &self,
        deterministic: TechnicalAnalysis,
        price: f64,
        ai_raw: Option<&Value>,
    ) -> TechnicalAnalysis {
        let Some(raw) = ai_raw else {
            return deterministic;
        };
        if !price.is_finite() || price <= 0.0 {
            debug!("Skipping AI technical merge for degenerate price");
            return deterministic;
        }

        let ai = match parse_technical(raw) {
            Ok(ai) => ai,
            Err(e) => {
                warn!(error = %e, "Discarding AI technical analysis");
                return deterministic;
            }
        };

        let TechnicalAnalysis {
            indicators,
            overall_sentiment,
            price_range,
        } = deterministic;

        let indicators = indicators.map(|mut det| {
            let matched = ai
                .indicators
                .iter()
                .find(|candidate| det.name.eq_ignore_ascii_case(candidate.name.trim()));

            let confidence = matched
                .and_then(|m| m.confidence)
                .unwrap_or(det.confidence);
            det.confidence = confidence.clamp(MIN_CONFIDENCE, 1.0);

            if let Some(description) = matched
                .and_then(|m| m.description.as_deref())
                .map(str::trim)
                .filter(|d| !d.is_empty())
            {
                det.description = description.to_string();
            }
            det
        });

        let conservative = if ai.overall_sentiment.abs() < overall_sentiment.abs() {
            ai.overall_sentiment
        } else {
            overall_sentiment
        };

        let price_range = PriceRange {
            low: ai
                .price_range
                .low
                .min(price_range.low)
                .min(price * RANGE_FLOOR_LOW),
            high: ai
                .price_range
                .high
                .max(price_range.high)
                .max(price * RANGE_FLOOR_HIGH),
            confidence: ai.price_range.confidence.min(price_range.confidence),
        };

        debug!("Merged AI technical analysis");
        TechnicalAnalysis {
            indicators,
            overall_sentiment: non_zero_sentiment(conservative),
            price_range,
        }
    }

    /// Merge an AI news analysis into the deterministic one
    ///
    /// The score is the mean of both sources and the label is re-derived
    /// from it; impacts take the larger estimate.
    pub fn merge_news(&self, deterministic: NewsAnalysis, ai_raw: Option<&Value>) -> NewsAnalysis {
        let Some(raw) = ai_raw else {
            return deterministic;
        };

        let ai = match parse_news(raw) {
            Ok(ai) => ai,
            Err(e) => {
                warn!(error = %e, "Discarding AI news analysis");
                return deterministic;
            }
        };

        if ai.sentiment != sentiment_from_score(ai.score) {
            debug!(
                label = %ai.sentiment,
                score = ai.score,
                "AI sentiment label disagrees with its score"
            );
        }

        let score = (deterministic.score + ai.score) / 2.0;
        NewsAnalysis {
            score,
            sentiment: sentiment_from_score(score),
            confidence: ai.confidence.clamp(MIN_CONFIDENCE, 1.0),
            impact: Impact {
                short_term: ai.impact.short_term.max(deterministic.impact.short_term),
                long_term: ai.impact.long_term.max(deterministic.impact.long_term),
            },
        }
    }
}
