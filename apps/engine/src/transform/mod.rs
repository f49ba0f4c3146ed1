//! Transformation Step: maps one raw record from its source schema to a target schema.
//!
//! The backend is pluggable behind [`Transformer`] (`Arc<dyn Transformer>`), so the
//! engine runs against the LLM in production and a deterministic stub in tests.
//! [`TransformationStep`] wraps any backend with the timeout, strict JSON parsing,
//! schema validation and single retry every record goes through.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::TransformError;

pub mod llm;
pub mod prompts;
pub mod step;
pub mod validation;

pub use llm::LlmTransformer;
pub use step::TransformationStep;
pub use validation::CompiledSchema;

/// Which attempt a request belongs to. A retry carries the reason the first output
/// was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Initial,
    Retry { reason: String },
}

/// The three JSON texts the step maps between.
#[derive(Debug, Clone)]
pub struct TransformRequest<'a> {
    pub data: &'a str,
    pub input_schema: &'a str,
    pub output_schema: &'a str,
    pub attempt: Attempt,
}

/// A transformation backend. Returns the backend's raw text; judging whether that
/// text honours the contract is [`TransformationStep`]'s job.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, request: &TransformRequest<'_>) -> Result<String, TransformError>;

    fn name(&self) -> &'static str;
}

/// Offline backend for dry runs: nests the raw record under `job` and emits the
/// other required sections empty.
pub struct MockTransformer;

#[async_trait]
impl Transformer for MockTransformer {
    async fn transform(&self, request: &TransformRequest<'_>) -> Result<String, TransformError> {
        let raw: Value = serde_json::from_str(request.data)
            .map_err(|e| TransformError::Backend(format!("mock could not read input: {e}")))?;
        let job_id = crate::models::job::record_key(&raw);
        let mut output = json!({
            "job": raw,
            "company": {},
            "compensation": {},
            "location": {}
        });
        if let (Some(id), Some(map)) = (job_id, output.as_object_mut()) {
            map.insert("jobId".to_string(), Value::String(id));
        }
        Ok(output.to_string())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
