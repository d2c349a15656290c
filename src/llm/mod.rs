//! LLM統合システム
//!
//! ホスト型LLM（Gemini、OpenAI）との統合機能を提供します。
//! プロバイダーはトレイトで抽象化され、パイプラインはクライアント経由で呼び出す。

pub mod client;
pub mod config;
pub mod error;
pub mod providers;
pub mod types;

pub use client::LlmClient;
pub use config::{LlmConfig, LlmProvider};
pub use error::{LlmError, LlmResult};
pub use providers::LlmProvider as Provider;
pub use types::{LlmRequest, LlmResponse, Message, Role, TokenUsage};
