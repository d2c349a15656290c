//! Stage 1: question to SQL

use super::{prompts, StageError};
use crate::llm::{LlmClient, LlmRequest};
use tracing::debug;

const SQL_MAX_TOKENS: usize = 2048;

/// Turns a question into a SQLite query with the hosted model.
#[derive(Clone)]
pub struct SqlGenerator {
    client: LlmClient,
    schema: String,
}

impl SqlGenerator {
    pub fn new(client: LlmClient) -> Self {
        Self::with_schema(client, prompts::SCHEMA_INFO)
    }

    pub fn with_schema(client: LlmClient, schema: impl Into<String>) -> Self {
        Self {
            client,
            schema: schema.into(),
        }
    }

    pub async fn generate(&self, question: &str) -> Result<String, StageError> {
        let request = LlmRequest::prompt(prompts::sql_prompt(&self.schema, question))
            .deterministic()
            .with_max_tokens(SQL_MAX_TOKENS);

        let response = self
            .client
            .complete(request)
            .await
            .map_err(|e| StageError::Generation(e.to_string()))?;

        let sql = clean_sql(&response.content);
        debug!(sql = %sql, "Generated SQL");
        Ok(sql)
    }
}

/// Strips surrounding whitespace and markdown fence markers.
pub fn clean_sql(raw: &str) -> String {
    raw.trim()
        .replace("```sql", "")
        .replace("```", "")
        .trim()
        .to_string()
}
