//! Mock provider implementation for testing.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;

/// Mock text provider.
///
/// By default it echoes the prompt so tests can assert on the assembled
/// context; a canned reply (including an empty one, for the fallback path)
/// can be injected instead.
pub struct MockTextProvider {
    enabled: bool,
    canned_reply: Option<String>,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            canned_reply: None,
        }
    }

    /// Always answer with `reply` instead of echoing the prompt.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            enabled: true,
            canned_reply: Some(reply.into()),
        }
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn complete(
        &self,
        _system: &str,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        let text = self
            .canned_reply
            .clone()
            .unwrap_or_else(|| format!("Mock response for: {}", prompt));

        Ok(ProviderResponse {
            text: Some(text),
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: 10,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}
