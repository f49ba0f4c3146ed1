use std::fmt;
use std::sync::Arc;

use jsonschema::Validator;
use serde_json::Value;

/// A JSON Schema compiled once, kept alongside its serialized text for prompts.
#[derive(Clone)]
pub struct CompiledSchema {
    text: Arc<str>,
    validator: Arc<Validator>,
}

impl CompiledSchema {
    /// Compiles `schema`; the error string is suitable for a configuration error.
    pub fn compile(schema: &Value) -> Result<Self, String> {
        if !schema.is_object() {
            return Err("schema must be a JSON object".to_string());
        }
        let validator = jsonschema::validator_for(schema).map_err(|e| e.to_string())?;
        let text = serde_json::to_string(schema).map_err(|e| e.to_string())?;
        Ok(Self {
            text: Arc::from(text),
            validator: Arc::new(validator),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Collects every violation as `"<instance path>: <message>"`.
    pub fn validate(&self, instance: &Value) -> Result<(), Vec<String>> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(instance)
            .map(|e| format!("{}: {}", e.instance_path, e))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_non_object_schema() {
        assert!(CompiledSchema::compile(&json!("string")).is_err());
        assert!(CompiledSchema::compile(&json!([])).is_err());
    }

    #[test]
    fn test_rejects_malformed_schema() {
        let err = CompiledSchema::compile(&json!({"type": 12})).unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn test_reports_every_violation_with_path() {
        let schema = CompiledSchema::compile(&json!({
            "type": "object",
            "properties": {
                "job": {"type": "object", "properties": {"title": {"type": "string"}}}
            },
            "required": ["job", "company"]
        }))
        .unwrap();

        assert!(schema.validate(&json!({"job": {}, "company": {}})).is_ok());

        let errors = schema
            .validate(&json!({"job": {"title": 3}}))
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.starts_with("/job/title")));
        assert!(errors.iter().any(|e| e.contains("company")));
        assert!(!schema.is_valid(&json!({"job": {"title": 3}})));
    }

    #[test]
    fn test_text_is_compact_serialization() {
        let schema = CompiledSchema::compile(&json!({"type": "object"})).unwrap();
        assert_eq!(schema.text(), r#"{"type":"object"}"#);
    }
}
