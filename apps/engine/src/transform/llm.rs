//! Generative-model backend for the Transformation Step.

use async_trait::async_trait;

use crate::errors::TransformError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::transform::prompts::{
    RETRY_RESTATEMENT_TEMPLATE, TRANSFORM_PROMPT_TEMPLATE, TRANSFORM_ROLE,
};
use crate::transform::{Attempt, TransformRequest, Transformer};

pub struct LlmTransformer {
    llm: LlmClient,
    system: String,
}

impl LlmTransformer {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            system: format!("{TRANSFORM_ROLE} {JSON_ONLY_SYSTEM} {NO_INVENTION_INSTRUCTION}"),
        }
    }
}

/// Renders the user prompt. The record is substituted last so its content is never
/// scanned for placeholders.
pub fn build_prompt(request: &TransformRequest<'_>) -> String {
    let mut prompt = TRANSFORM_PROMPT_TEMPLATE
        .replace("{outputSchema}", request.output_schema)
        .replace("{inputSchema}", request.input_schema)
        .replace("{data}", request.data);
    if let Attempt::Retry { reason } = &request.attempt {
        prompt.push_str(&RETRY_RESTATEMENT_TEMPLATE.replace("{reason}", reason));
    }
    prompt
}

#[async_trait]
impl Transformer for LlmTransformer {
    async fn transform(&self, request: &TransformRequest<'_>) -> Result<String, TransformError> {
        let prompt = build_prompt(request);
        self.llm
            .call_text(&prompt, &self.system)
            .await
            .map_err(|e| TransformError::Backend(format!("LLM transformation failed: {e}")))
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}
