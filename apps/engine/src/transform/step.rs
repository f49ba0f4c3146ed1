//! Invocation wrapper around a [`Transformer`] backend.
//!
//! Flow per record: serialize → call backend (with timeout) → parse strictly →
//! check object shape → validate against the target schema. A contract violation
//! earns exactly one retry with the stricter restatement.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::TransformError;
use crate::models::job::RawJob;
use crate::transform::validation::CompiledSchema;
use crate::transform::{Attempt, TransformRequest, Transformer};

pub struct TransformationStep {
    transformer: Arc<dyn Transformer>,
    timeout: Duration,
}

impl TransformationStep {
    pub fn new(transformer: Arc<dyn Transformer>, timeout: Duration) -> Self {
        Self {
            transformer,
            timeout,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.transformer.name()
    }

    /// Transforms one raw record into a document that validates against `target`.
    pub async fn apply(
        &self,
        raw: &RawJob,
        input_schema: &CompiledSchema,
        target: &CompiledSchema,
    ) -> Result<Map<String, Value>, TransformError> {
        let data = raw.to_string();
        let mut attempt = Attempt::Initial;

        loop {
            let request = TransformRequest {
                data: &data,
                input_schema: input_schema.text(),
                output_schema: target.text(),
                attempt: attempt.clone(),
            };

            let outcome = match self.invoke(&request).await {
                Ok(text) => accept(&text, target),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(document) => return Ok(document),
                Err(e) if e.is_retryable() && attempt == Attempt::Initial => {
                    warn!(
                        error = %e,
                        "Transformation output rejected, retrying with stricter instructions"
                    );
                    attempt = Attempt::Retry {
                        reason: e.to_string(),
                    };
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn invoke(&self, request: &TransformRequest<'_>) -> Result<String, TransformError> {
        tokio::time::timeout(self.timeout, self.transformer.transform(request))
            .await
            .map_err(|_| TransformError::Timeout(self.timeout))?
    }
}

/// Accepts only a bare JSON object that validates against `target`. Wrapping prose
/// or code fences fail the parse. A `null` property stands for an absent value: it is
/// validated as missing and kept in the returned document.
fn accept(text: &str, target: &CompiledSchema) -> Result<Map<String, Value>, TransformError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| TransformError::NotJson(e.to_string()))?;
    target
        .validate(&without_null_properties(&value))
        .map_err(TransformError::Schema)?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(TransformError::NotObject(json_kind(&other))),
    }
}

fn without_null_properties(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_null_properties(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_null_properties).collect()),
        other => other.clone(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
