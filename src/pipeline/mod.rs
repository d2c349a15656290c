//! Question answering pipeline
//!
//! Three stages in fixed order:
//!
//! 1. [`SqlGenerator`] asks the model for a SQLite query,
//! 2. [`QueryExecutor`] runs it against the sales database,
//! 3. [`AnswerGenerator`] asks the model to explain the rows.
//!
//! Each stage hands the next one a `Result`. A failed stage skips the
//! remaining SQL work and its message becomes the answer.

pub mod answer;
pub mod executor;
pub mod prompts;
pub mod sql_generator;

pub use answer::AnswerGenerator;
pub use executor::{ExecutedQuery, QueryExecutor, NO_RESULTS};
pub use sql_generator::{clean_sql, SqlGenerator};

use crate::llm::LlmClient;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Failure of stage 1 or 2, carried forward to stage 3.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StageError {
    #[error("Error generating SQL: {0}")]
    Generation(String),

    #[error("Error executing SQL: {message}")]
    Execution { sql: String, message: String },
}

impl StageError {
    /// SQL that was generated before the failure, if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            StageError::Generation(_) => None,
            StageError::Execution { sql, .. } => Some(sql),
        }
    }
}

/// Pipeline settings passed in explicitly at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// SQLite file the generated SQL runs against
    pub database_path: PathBuf,
    /// Open the executor connection read-only
    #[serde(default)]
    pub read_only: bool,
}

impl PipelineConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            read_only: false,
        }
    }
}

/// What a run returns to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub question: String,
    pub answer: String,
    pub sql_query: String,
    pub raw_results: String,
}

/// Generator → executor → responder, always in that order.
#[derive(Clone)]
pub struct QueryPipeline {
    generator: SqlGenerator,
    executor: QueryExecutor,
    responder: AnswerGenerator,
}

impl QueryPipeline {
    pub fn new(config: PipelineConfig, client: LlmClient) -> Self {
        Self {
            generator: SqlGenerator::new(client.clone()),
            executor: QueryExecutor::new(config.database_path).read_only(config.read_only),
            responder: AnswerGenerator::new(client),
        }
    }

    pub async fn run(&self, question: &str) -> QueryAnswer {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id, question = %question);
        self.run_stages(question).instrument(span).await
    }

    async fn run_stages(&self, question: &str) -> QueryAnswer {
        let executed = match self.generator.generate(question).await {
            Ok(sql) => self.executor.execute(sql).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &executed {
            warn!(error = %e, "Pipeline stage failed");
        }

        let answer = self.responder.summarize(question, &executed).await;

        let (sql_query, raw_results) = match executed {
            Ok(done) => (done.sql, done.rendered),
            Err(e) => (e.sql().unwrap_or_default().to_string(), String::new()),
        };

        info!("Pipeline finished");
        QueryAnswer {
            question: question.to_string(),
            answer,
            sql_query,
            raw_results,
        }
    }
}
