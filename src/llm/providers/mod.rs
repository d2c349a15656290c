//! LLMプロバイダー実装

pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;

use crate::llm::{
    config::LlmConfig,
    error::LlmResult,
    types::{LlmRequest, LlmResponse},
};
use async_trait::async_trait;

/// LLMプロバイダートレイト
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// 通常の完了リクエスト
    async fn complete(&self, request: &LlmRequest) -> LlmResult<LlmResponse>;

    /// プロバイダー名を取得
    fn name(&self) -> &str;
}

/// プロバイダーファクトリー
pub fn create_provider(config: &LlmConfig) -> LlmResult<Box<dyn LlmProvider>> {
    use crate::llm::config::LlmProvider as ProviderType;

    match config.provider {
        ProviderType::Gemini => Ok(Box::new(gemini::GeminiProvider::new(config.clone())?)),
        #[cfg(feature = "openai")]
        ProviderType::OpenAI => Ok(Box::new(openai::OpenAIProvider::new(config.clone())?)),
        #[cfg(not(feature = "openai"))]
        ProviderType::OpenAI => Err(crate::llm::error::LlmError::UnsupportedProvider(
            "OpenAI support requires the `openai` feature".to_string(),
        )),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_gemini_provider_without_key() {
        let provider = create_provider(&LlmConfig::default()).unwrap();
        assert_eq!(provider.name(), "Gemini");
    }

    #[cfg(feature = "openai")]
    #[test]
    fn test_create_openai_provider() {
        let config = LlmConfig::openai("test-key", "gpt-4o-mini");
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "OpenAI");
    }
}
