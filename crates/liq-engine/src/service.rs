//! Analysis service
//!
//! Ties sources, indicators, sentiment, AI and the caches together. Every
//! produced result is cached per pair; repeated calls within the TTL return
//! the same `Arc`.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::ai::AiAnalysisProvider;
use crate::api::{CoinGeckoClient, FinnhubClient};
use crate::cache::CacheManager;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::indicators::{IndicatorEngine, build_report};
use crate::merger::AnalysisMerger;
use crate::model::{
    HeadlineItem, MarketSnapshot, NewsDigest, Prediction, SentimentReport, TechnicalReport,
};
use crate::prediction::PredictionSynthesizer;
use crate::sentiment::{SentimentScorer, aggregate};
use crate::sources::{MarketDataSource, NewsSource, StaticNews};

/// Technical analysis, sentiment and range prediction for one pair
pub struct AnalysisService {
    config: EngineConfig,
    market: Arc<dyn MarketDataSource>,
    news: Arc<dyn NewsSource>,
    ai: Option<Arc<dyn AiAnalysisProvider>>,
    caches: CacheManager,
    indicators: IndicatorEngine,
    scorer: SentimentScorer,
    merger: AnalysisMerger,
    synthesizer: PredictionSynthesizer,
}

impl AnalysisService {
    /// Create a service over the given sources, without AI
    pub fn new(
        config: EngineConfig,
        market: Arc<dyn MarketDataSource>,
        news: Arc<dyn NewsSource>,
    ) -> Self {
        Self {
            indicators: IndicatorEngine::new(config.strict_rsi),
            caches: CacheManager::new(config.cache_retention),
            config,
            market,
            news,
            ai: None,
            scorer: SentimentScorer::default(),
            merger: AnalysisMerger::new(),
            synthesizer: PredictionSynthesizer::new(),
        }
    }

    /// CoinGecko market data and Finnhub news (empty news without a key)
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let market = CoinGeckoClient::new(
            &config.coin_id,
            &config.vs_currency,
            config.market_rate_limit,
            config.request_timeout,
        )?
        .with_api_key(config.coingecko_api_key.clone());

        let news: Arc<dyn NewsSource> = match &config.finnhub_api_key {
            Some(key) => Arc::new(
                FinnhubClient::new(key, config.news_rate_limit, config.request_timeout)?
                    .with_max_headlines(config.max_headlines),
            ),
            None => {
                warn!("FINNHUB_API_KEY not set, sentiment will use no headlines");
                Arc::new(StaticNews::default())
            }
        };

        Ok(Self::new(config, Arc::new(market), news))
    }

    /// Refine results with an AI provider
    pub fn with_ai(mut self, ai: Arc<dyn AiAnalysisProvider>) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drop every cached result
    pub async fn clear_cache(&self) {
        self.caches.clear_all().await;
    }

    fn key(&self, kind: &str) -> String {
        format!("{}:{kind}", self.config.pair_key())
    }

    /// Run an AI call under the configured timeout; failures become `None`
    async fn bounded_ai(
        &self,
        task: &'static str,
        call: impl Future<Output = Result<Value>>,
    ) -> Option<Value> {
        match tokio::time::timeout(self.config.ai_timeout, call).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(task, error = %e, "AI call failed, using deterministic result");
                None
            }
            Err(_) => {
                warn!(
                    task,
                    timeout = ?self.config.ai_timeout,
                    "AI call timed out, using deterministic result"
                );
                None
            }
        }
    }

    /// Latest market snapshot
    pub async fn snapshot(&self) -> Result<MarketSnapshot> {
        self.caches
            .snapshots
            .get_or_compute(&self.key("snapshot"), self.config.cache_ttl_snapshot, move || {
                self.market.fetch()
            })
            .await
    }

    /// Recent headlines with classified sentiment
    pub async fn headlines(&self) -> Result<Arc<Vec<HeadlineItem>>> {
        self.caches
            .headlines
            .get_or_compute(
                &self.key("headlines"),
                self.config.cache_ttl_headlines,
                move || async move {
                    let raw = self.news.fetch().await?;
                    Ok(Arc::new(self.scorer.classify_headlines(raw)))
                },
            )
            .await
    }

    /// Indicators, overall sentiment and price range
    #[instrument(skip(self), fields(pair = %self.config.pair_key()))]
    pub async fn technical_analysis(&self) -> Result<Arc<TechnicalReport>> {
        self.caches
            .technical
            .get_or_compute(
                &self.key("technical"),
                self.config.cache_ttl_technical,
                move || async move {
                    let snapshot = self.snapshot().await?;
                    let deterministic = self.indicators.analyze(&snapshot);

                    let ai_raw = match &self.ai {
                        Some(ai) if !snapshot.is_degenerate() => {
                            self.bounded_ai(
                                "technical",
                                ai.analyze_technical(&snapshot, &deterministic),
                            )
                            .await
                        }
                        _ => None,
                    };

                    let merged =
                        self.merger
                            .merge_technical(deterministic, snapshot.price, ai_raw.as_ref());
                    Ok(Arc::new(build_report(&snapshot, &merged)))
                },
            )
            .await
    }

    /// Headlines with the news analysis
    #[instrument(skip(self), fields(pair = %self.config.pair_key()))]
    pub async fn sentiment(&self) -> Result<Arc<SentimentReport>> {
        self.caches
            .sentiment
            .get_or_compute(
                &self.key("sentiment"),
                self.config.cache_ttl_sentiment,
                move || async move {
                    let headlines = self.headlines().await?;
                    let deterministic = self.scorer.analyze(&headlines);

                    let ai_raw = match &self.ai {
                        Some(ai) if !headlines.is_empty() => {
                            self.bounded_ai("news", ai.analyze_news(&headlines)).await
                        }
                        _ => None,
                    };

                    let analysis = self.merger.merge_news(deterministic, ai_raw.as_ref());
                    Ok(Arc::new(SentimentReport {
                        news: NewsDigest {
                            score: aggregate(headlines.iter().map(|h| h.sentiment)),
                            headlines: headlines.to_vec(),
                        },
                        analysis,
                    }))
                },
            )
            .await
    }

    /// Liquidity range prediction
    #[instrument(skip(self), fields(pair = %self.config.pair_key()))]
    pub async fn prediction(&self) -> Result<Arc<Prediction>> {
        self.caches
            .predictions
            .get_or_compute(
                &self.key("prediction"),
                self.config.cache_ttl_prediction,
                move || async move {
                    let (technical, sentiment) =
                        tokio::try_join!(self.technical_analysis(), self.sentiment())?;

                    let price = technical.price_24h.current;
                    let analysis = technical.analysis();

                    let ai_raw = match &self.ai {
                        Some(ai) if price.is_finite() && price > 0.0 => {
                            self.bounded_ai(
                                "prediction",
                                ai.predict_range(price, &analysis, &sentiment.analysis),
                            )
                            .await
                        }
                        _ => None,
                    };

                    let prediction = self.synthesizer.synthesize(
                        price,
                        &analysis,
                        &sentiment.analysis,
                        ai_raw.as_ref(),
                    );
                    info!(
                        low = prediction.range_low,
                        high = prediction.range_high,
                        confidence = prediction.confidence,
                        source = ?prediction.source,
                        "Prediction ready"
                    );
                    Ok(Arc::new(prediction))
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockAiAnalysisProvider;
    use crate::error::EngineError;
    use crate::model::PredictionSource;
    use crate::sources::{MockMarketDataSource, MockNewsSource};
    use serde_json::json;

    fn market(times: usize) -> MockMarketDataSource {
        let mut mock = MockMarketDataSource::new();
        mock.expect_fetch()
            .times(times)
            .returning(|| Ok(MarketSnapshot::new(2000.0, 1_000_000.0, 2.0, 0.0)));
        mock
    }

    fn news(times: usize) -> MockNewsSource {
        let mut mock = MockNewsSource::new();
        mock.expect_fetch().times(times).returning(|| {
            Ok(vec![
                HeadlineItem::new("Major partnership and mainnet launch boosts adoption", "https://a"),
                HeadlineItem::new("Exchange suffers hack, funds at risk", "https://b"),
            ])
        });
        mock
    }

    #[tokio::test]
    async fn test_technical_analysis_is_cached() {
        let service = AnalysisService::new(
            EngineConfig::default(),
            Arc::new(market(1)),
            Arc::new(news(0)),
        );

        let first = service.technical_analysis().await.unwrap();
        let second = service.technical_analysis().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.price_24h.current, 2000.0);
    }

    #[tokio::test]
    async fn test_sentiment_classifies_headlines() {
        let service = AnalysisService::new(
            EngineConfig::default(),
            Arc::new(market(0)),
            Arc::new(news(1)),
        );

        let report = service.sentiment().await.unwrap();
        assert_eq!(report.news.headlines.len(), 2);
        assert_eq!(report.news.score, 0.5);
        assert_eq!(report.analysis.sentiment, crate::model::Sentiment::Neutral);
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let mut failing = MockMarketDataSource::new();
        failing
            .expect_fetch()
            .returning(|| Err(EngineError::upstream("coingecko", "HTTP 502")));

        // the news branch may be cancelled before it fetches
        let mut news = MockNewsSource::new();
        news.expect_fetch().returning(|| Ok(Vec::new()));

        let service =
            AnalysisService::new(EngineConfig::default(), Arc::new(failing), Arc::new(news));
        let err = service.prediction().await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_ai_errors_fall_back() {
        let mut ai = MockAiAnalysisProvider::new();
        ai.expect_analyze_technical()
            .times(1)
            .returning(|_, _| Err(EngineError::AiProvider("rate limited".to_string())));
        ai.expect_analyze_news()
            .times(1)
            .returning(|_| Ok(json!({"unexpected": true})));
        ai.expect_predict_range()
            .times(1)
            .returning(|_, _, _| Ok(json!({"rangeLow": 10.0, "rangeHigh": 5.0, "confidence": 50.0})));

        let service = AnalysisService::new(
            EngineConfig::default(),
            Arc::new(market(1)),
            Arc::new(news(1)),
        )
        .with_ai(Arc::new(ai));

        let prediction = service.prediction().await.unwrap();
        assert_eq!(prediction.source, PredictionSource::Fallback);
        assert!(prediction.range_high > prediction.range_low);
        assert!((60.0..=95.0).contains(&prediction.confidence));
    }

    #[tokio::test]
    async fn test_valid_ai_prediction_used() {
        let mut ai = MockAiAnalysisProvider::new();
        ai.expect_analyze_technical()
            .returning(|_, _| Ok(json!({})));
        ai.expect_analyze_news().returning(|_| Ok(json!({})));
        ai.expect_predict_range().returning(|_, _, _| {
            Ok(json!({"rangeLow": 1950.0, "rangeHigh": 2080.0, "confidence": 70.0}))
        });

        let service = AnalysisService::new(
            EngineConfig::default(),
            Arc::new(market(1)),
            Arc::new(news(1)),
        )
        .with_ai(Arc::new(ai));

        let prediction = service.prediction().await.unwrap();
        assert_eq!(prediction.source, PredictionSource::Ai);
        assert_eq!(prediction.range_low, 1950.0);
    }

    #[tokio::test]
    async fn test_clear_cache_refetches() {
        let service = AnalysisService::new(
            EngineConfig::default(),
            Arc::new(market(2)),
            Arc::new(news(0)),
        );

        service.technical_analysis().await.unwrap();
        service.clear_cache().await;
        service.technical_analysis().await.unwrap();
    }
}
