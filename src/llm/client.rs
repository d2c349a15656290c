//! LLMクライアント

use crate::llm::{
    config::LlmConfig,
    error::LlmResult,
    providers::{create_provider, LlmProvider},
    types::{LlmRequest, LlmResponse},
};
use std::sync::Arc;
use tracing::debug;

/// LLMクライアント
///
/// Cheap to clone; every clone shares the same provider.
#[derive(Clone)]
pub struct LlmClient {
    provider: Arc<dyn LlmProvider>,
    config: LlmConfig,
}

impl LlmClient {
    /// 設定からプロバイダーを選んでクライアントを作成
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        config.validate()?;
        let provider = create_provider(&config)?;

        Ok(Self {
            provider: Arc::from(provider),
            config,
        })
    }

    /// 任意のプロバイダーでクライアントを作成
    pub fn with_provider(config: LlmConfig, provider: Arc<dyn LlmProvider>) -> LlmResult<Self> {
        config.validate()?;
        Ok(Self { provider, config })
    }

    /// 設定を取得
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// 完了リクエストを送信
    pub async fn complete(&self, request: LlmRequest) -> LlmResult<LlmResponse> {
        let response = self.provider.complete(&request).await?;
        debug!(
            provider = self.provider.name(),
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "LLM completion finished"
        );
        Ok(response)
    }

    /// プロバイダー名を取得
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = LlmConfig::gemini("test-key", "gemini-2.0-flash-exp");
        let client = LlmClient::new(config).unwrap();
        assert_eq!(client.provider_name(), "Gemini");
    }

    #[test]
    fn test_client_creation_invalid_config() {
        let mut config = LlmConfig::gemini("test-key", "gemini-2.0-flash-exp");
        config.default_temperature = 5.0;
        assert!(LlmClient::new(config).is_err());
    }
}
