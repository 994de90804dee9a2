//! Liquidity range analysis and prediction engine
//!
//! This crate turns a market snapshot and recent headlines into three
//! results for a crypto pair:
//!
//! - Technical analysis: eight indicators (EMA, MACD, RSI, StochRSI,
//!   Bollinger Bands, ATR, Fibonacci, VPVR), overall sentiment, price range
//! - News sentiment: lexical headline classification and an aggregate view
//! - Range prediction: where liquidity should sit, with a confidence score
//!
//! Every result is computed deterministically first. When an AI provider is
//! configured its answer is validated and merged in; anything malformed,
//! late or failing falls back to the deterministic result.
//!
//! # Architecture
//!
//! - `indicators`, `sentiment`: pure deterministic math
//! - `merger`, `prediction`: AI validation, merge and fallback synthesis
//! - `cache`: TTL cache with single-flight recomputation
//! - `sources`, `api`: market data and news (CoinGecko, Finnhub)
//! - `ai`, `prompts`: AI provider over any `liq_llm::LLMProvider`
//! - `service`: `AnalysisService`, the produced interface
//!
//! # Example
//!
//! ```rust,ignore
//! use liq_engine::{AnalysisService, EngineConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = AnalysisService::from_config(EngineConfig::from_env()?)?;
//!
//!     let prediction = service.prediction().await?;
//!     println!("{} - {}", prediction.range_low, prediction.range_high);
//!
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod indicators;
pub mod merger;
pub mod model;
pub mod prediction;
pub mod prompts;
pub mod sentiment;
pub mod service;
pub mod sources;

// Re-export main types for convenience
pub use ai::{AiAnalysisProvider, LlmAnalysisProvider};
pub use cache::{CacheManager, ResultCache};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use indicators::IndicatorEngine;
pub use merger::AnalysisMerger;
pub use model::{
    HeadlineItem, Indicator, IndicatorKind, MarketSnapshot, NewsAnalysis, Prediction,
    PredictionSource, PriceRange, Sentiment, SentimentReport, Signal, TechnicalAnalysis,
    TechnicalReport,
};
pub use prediction::PredictionSynthesizer;
pub use sentiment::SentimentScorer;
pub use service::AnalysisService;
pub use sources::{MarketDataSource, NewsSource, StaticMarketData, StaticNews};
