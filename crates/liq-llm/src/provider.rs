//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for LLM providers
///
/// Implementations hand a completion request to some model backend and
/// return the assistant's reply. Test code mocks this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "openai")
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Message, StopReason, TokenUsage};

    #[tokio::test]
    async fn test_mock_provider_round_trip() {
        let mut provider = MockLLMProvider::new();
        provider.expect_complete().times(1).returning(|request| {
            assert!(request.system.is_some());
            Ok(CompletionResponse {
                message: Message::assistant(r#"{"ok":true}"#),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage {
                    input_tokens: 10,
                    output_tokens: 4,
                },
            })
        });

        let request = CompletionRequest::builder("test-model")
            .system("answer in JSON")
            .add_message(Message::user("ping"))
            .build();
        let response = provider.complete(request).await.unwrap();
        assert_eq!(response.message.text(), Some(r#"{"ok":true}"#));
    }
}
