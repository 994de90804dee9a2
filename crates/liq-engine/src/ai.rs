//! AI analysis provider
//!
//! The provider only fetches raw JSON. Whether that JSON is usable is
//! decided by the merger and the prediction synthesizer.

use async_trait::async_trait;
use liq_llm::{CompletionRequest, LLMProvider, Message};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{EngineError, Result};
use crate::model::{HeadlineItem, MarketSnapshot, NewsAnalysis, TechnicalAnalysis};
use crate::prompts;

/// Source of AI opinions on market data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiAnalysisProvider: Send + Sync {
    /// Review a snapshot and its deterministic indicator readings
    async fn analyze_technical(
        &self,
        snapshot: &MarketSnapshot,
        deterministic: &TechnicalAnalysis,
    ) -> Result<Value>;

    /// Judge classified headlines
    async fn analyze_news(&self, headlines: &[HeadlineItem]) -> Result<Value>;

    /// Predict a liquidity range
    async fn predict_range(
        &self,
        price: f64,
        technical: &TechnicalAnalysis,
        news: &NewsAnalysis,
    ) -> Result<Value>;
}

/// The JSON object spanning the first `{` to the last `}` of a reply
pub fn extract_json(reply: &str) -> Result<Value> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let (Some(start), Some(end)) = (start, end) else {
        return Err(EngineError::AiValidation(
            "reply contains no JSON object".to_string(),
        ));
    };
    if end < start {
        return Err(EngineError::AiValidation(
            "reply contains no JSON object".to_string(),
        ));
    }

    serde_json::from_str(&reply[start..=end])
        .map_err(|e| EngineError::AiValidation(format!("reply is not valid JSON: {e}")))
}

/// [`AiAnalysisProvider`] backed by a chat-completion model
pub struct LlmAnalysisProvider {
    llm: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: usize,
    temperature: f32,
}

impl LlmAnalysisProvider {
    pub fn new(llm: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            max_tokens: 1024,
            temperature: 0.2,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[instrument(skip_all, fields(provider = self.llm.name(), model = %self.model))]
    async fn ask(&self, system: &str, user: String) -> Result<Value> {
        let request = CompletionRequest::builder(&self.model)
            .system(system)
            .add_message(Message::user(user))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .json_mode()
            .build();

        let response = self.llm.complete(request).await?;
        debug!(tokens = response.usage.total(), "AI reply received");

        let text = response
            .message
            .text()
            .ok_or_else(|| EngineError::AiProvider("empty reply".to_string()))?;
        extract_json(text)
    }
}

#[async_trait]
impl AiAnalysisProvider for LlmAnalysisProvider {
    async fn analyze_technical(
        &self,
        snapshot: &MarketSnapshot,
        deterministic: &TechnicalAnalysis,
    ) -> Result<Value> {
        self.ask(
            prompts::TECHNICAL_ANALYST,
            prompts::technical_request(snapshot, deterministic),
        )
        .await
    }

    async fn analyze_news(&self, headlines: &[HeadlineItem]) -> Result<Value> {
        self.ask(prompts::NEWS_ANALYST, prompts::news_request(headlines))
            .await
    }

    async fn predict_range(
        &self,
        price: f64,
        technical: &TechnicalAnalysis,
        news: &NewsAnalysis,
    ) -> Result<Value> {
        self.ask(
            prompts::RANGE_PREDICTOR,
            prompts::prediction_request(price, technical, news),
        )
        .await
    }
}
