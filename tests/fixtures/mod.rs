//! Test fixtures
//!
//! テスト用のモックプロバイダーとデータベース

#![allow(dead_code)]

use async_trait::async_trait;
use sales_query::llm::{
    LlmClient, LlmConfig, LlmError, LlmRequest, LlmResponse, LlmResult, Provider, TokenUsage,
};
use sales_query::pipeline::{PipelineConfig, QueryPipeline};
use sales_query::sales::{Money, NewSale, SaleStore};
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// One queued model outcome
pub enum Reply {
    Text(String),
    Fail(String),
}

/// モックLLMプロバイダー（返答を順番に返す）
#[derive(Clone, Default)]
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<LlmRequest>>>,
}

impl MockProvider {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn client(&self) -> LlmClient {
        LlmClient::with_provider(LlmConfig::default(), Arc::new(self.clone())).unwrap()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: &LlmRequest) -> LlmResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(content)) => Ok(LlmResponse {
                content,
                model: "mock".to_string(),
                usage: TokenUsage::default(),
                finish_reason: None,
            }),
            Some(Reply::Fail(message)) => Err(LlmError::ApiError(message)),
            None => Err(LlmError::EmptyResponse("no mock reply left".to_string())),
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }
}

pub fn text(s: &str) -> Reply {
    Reply::Text(s.to_string())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Temporary database seeded with a few sales.
pub struct TestDb {
    pub dir: TempDir,
    pub path: PathBuf,
    pub store: SaleStore,
}

impl TestDb {
    pub async fn empty() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.sqlite3");
        let store = SaleStore::open(&path).await.unwrap();
        store.migrate().await.unwrap();
        Self { dir, path, store }
    }

    /// XYZ twice in March 2024, ABC once in April 2024.
    pub async fn seeded() -> Self {
        let db = Self::empty().await;
        for (product, sold, purchased, on) in [
            ("XYZ", 1525, 1000, date(2024, 3, 1)),
            ("XYZ", 1475, 900, date(2024, 3, 15)),
            ("ABC", 999, 500, date(2024, 4, 2)),
        ] {
            let sale = NewSale::new(
                product,
                Money::from_cents(sold),
                Money::from_cents(purchased),
            )
            .on(on);
            db.store.insert(&sale).await.unwrap();
        }
        db
    }

    pub fn pipeline(&self, provider: &MockProvider) -> QueryPipeline {
        QueryPipeline::new(PipelineConfig::new(&self.path), provider.client())
    }
}
