//! LLM completion layer for liq-rs
//!
//! This crate provides the small, provider-agnostic surface the analysis
//! engine needs to ask a language model for structured (JSON) answers:
//!
//! - Message types for a single-turn chat exchange
//! - Completion request/response types, including JSON response mode
//! - Provider trait for LLM implementations
//! - An OpenAI-compatible provider (behind the `openai` feature)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, ResponseFormat, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
#[cfg(feature = "openai")]
pub mod providers;
