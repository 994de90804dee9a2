//! Error types for analysis and prediction operations

use thiserror::Error;

/// Engine specific errors
///
/// Only `Upstream`, `Network` and `Config` ever leave the engine.
/// AI and degenerate-input failures are absorbed by the deterministic
/// fallback and exist so internal helpers can return `Result`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A market or news source failed to deliver data
    #[error("Upstream fetch from {source_name} failed: {message}")]
    Upstream {
        source_name: String,
        message: String,
    },

    /// AI output was malformed or out of range
    #[error("AI validation error: {0}")]
    AiValidation(String),

    /// AI provider call failed or timed out
    #[error("AI provider error: {0}")]
    AiProvider(String),

    /// Snapshot unusable for indicator math (price <= 0, missing volume)
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Shorthand for an upstream failure
    pub fn upstream(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Copy of this error for callers sharing one computation
    ///
    /// `Network` wraps a non-cloneable `reqwest::Error` and is carried over
    /// as `Upstream` with the same message.
    pub(crate) fn replicate(&self) -> Self {
        match self {
            Self::Upstream {
                source_name,
                message,
            } => Self::upstream(source_name.clone(), message.clone()),
            Self::AiValidation(msg) => Self::AiValidation(msg.clone()),
            Self::AiProvider(msg) => Self::AiProvider(msg.clone()),
            Self::DegenerateInput(msg) => Self::DegenerateInput(msg.clone()),
            Self::Network(e) => Self::upstream("network", e.to_string()),
            Self::Config(msg) => Self::Config(msg.clone()),
        }
    }

    /// Whether the error originates from a data source
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Network(_))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Convert liq_llm::LLMError to EngineError
impl From<liq_llm::LLMError> for EngineError {
    fn from(err: liq_llm::LLMError) -> Self {
        EngineError::AiProvider(err.to_string())
    }
}
