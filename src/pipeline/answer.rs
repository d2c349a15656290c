//! Stage 3: results to a natural-language answer

use super::{executor::ExecutedQuery, prompts, StageError};
use crate::llm::{LlmClient, LlmRequest};
use tracing::warn;

#[derive(Clone)]
pub struct AnswerGenerator {
    client: LlmClient,
}

impl AnswerGenerator {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    /// Never fails: earlier stage errors and model errors become the answer.
    pub async fn summarize(
        &self,
        question: &str,
        executed: &Result<ExecutedQuery, StageError>,
    ) -> String {
        let executed = match executed {
            Ok(executed) => executed,
            Err(e) => return format!("I encountered an error: {}", e),
        };

        let request = LlmRequest::prompt(prompts::answer_prompt(question, &executed.rendered));

        match self.client.complete(request).await {
            Ok(response) => response.content.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Answer generation failed");
                format!("Error generating response: {}", e)
            }
        }
    }
}
