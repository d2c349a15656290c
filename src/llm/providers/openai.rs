//! OpenAIプロバイダー実装

use crate::llm::{
    config::LlmConfig,
    error::{LlmError, LlmResult},
    providers::LlmProvider,
    types::{LlmRequest, LlmResponse, Message, Role, TokenUsage},
};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

/// OpenAIプロバイダー
pub struct OpenAIProvider {
    client: Client<OpenAIConfig>,
    config: LlmConfig,
}

impl OpenAIProvider {
    /// 新しいOpenAIプロバイダーを作成
    ///
    /// キーが未設定でも作成でき、呼び出し時に認証エラーになる。
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        config.validate()?;

        let mut openai_config =
            OpenAIConfig::new().with_api_key(config.get_api_key().unwrap_or_default());

        if let Some(endpoint) = &config.endpoint {
            openai_config = openai_config.with_api_base(endpoint);
        }

        let client = Client::with_config(openai_config);

        Ok(Self { client, config })
    }

    /// メッセージを変換
    fn convert_messages(&self, messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .filter_map(|msg| match msg.role {
                Role::System => ChatCompletionRequestSystemMessageArgs::default()
                    .content(msg.content.clone())
                    .build()
                    .ok()
                    .map(Into::into),
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(msg.content.clone())
                    .build()
                    .ok()
                    .map(Into::into),
                // 単発プロンプトのみ扱うため履歴は送らない
                Role::Assistant => None,
            })
            .collect()
    }

    fn non_empty(content: Option<String>, model: &str) -> LlmResult<String> {
        match content {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(LlmError::EmptyResponse(format!("no text returned by {}", model))),
        }
    }

    fn map_error(err: OpenAIError) -> LlmError {
        match err {
            OpenAIError::Reqwest(e) => LlmError::NetworkError(e.to_string()),
            OpenAIError::ApiError(api) => LlmError::ApiError(api.message),
            OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg),
            other => LlmError::ApiError(other.to_string()),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    #[allow(deprecated)]
    async fn complete(&self, request: &LlmRequest) -> LlmResult<LlmResponse> {
        self.config.require_api_key()?;

        let messages = self.convert_messages(&request.messages);

        let model = request
            .model
            .as_ref()
            .unwrap_or(&self.config.default_model)
            .clone();

        let mut req_builder = CreateChatCompletionRequestArgs::default();
        req_builder
            .model(&model)
            .messages(messages)
            .temperature(
                request
                    .temperature
                    .unwrap_or(self.config.default_temperature),
            )
            .max_tokens(
                request
                    .max_tokens
                    .unwrap_or(self.config.default_max_tokens) as u32,
            );

        if let Some(top_p) = request.top_p {
            req_builder.top_p(top_p);
        }

        let chat_request = req_builder
            .build()
            .map_err(|e| LlmError::InvalidRequest(e.to_string()))?;

        let response = tokio::time::timeout(
            self.config.timeout(),
            self.client.chat().create(chat_request),
        )
        .await
        .map_err(|_| LlmError::Timeout(self.config.timeout_secs))?
        .map_err(Self::map_error)?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| LlmError::EmptyResponse("No choices in response".to_string()))?;

        let content = Self::non_empty(choice.message.content.clone(), &response.model)?;

        let usage = if let Some(u) = response.usage {
            TokenUsage::new(u.prompt_tokens as usize, u.completion_tokens as usize)
        } else {
            TokenUsage::default()
        };

        Ok(LlmResponse {
            content,
            model: response.model,
            usage,
            finish_reason: choice.finish_reason.as_ref().map(|r| format!("{:?}", r)),
        })
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}
