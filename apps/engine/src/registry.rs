//! Schema Registry: the static table of providers and the shared normalized schema.
//!
//! Loaded once at startup and validated eagerly: a malformed entry fails the load
//! instead of surfacing later as a per-record failure.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::ConfigError;
use crate::models::company::CompanyConfig;
use crate::transform::validation::CompiledSchema;

/// Top-level keys every normalized record must carry.
pub const REQUIRED_TOP_LEVEL_KEYS: [&str; 4] = ["job", "company", "compensation", "location"];

const BUILTIN_REGISTRY: &str = include_str!("../config/companies.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedSchema {
    pub version: String,
    pub schema: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registry {
    companies: Vec<CompanyConfig>,
    #[serde(rename = "normalized_data")]
    normalized: NormalizedSchema,
}

impl Registry {
    /// The demo providers compiled into the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_REGISTRY)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json(&content)?;
        info!(
            "Loaded {} companies from {}",
            registry.companies.len(),
            path.display()
        );
        Ok(registry)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let registry: Registry = serde_json::from_str(content)?;
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_normalized_schema(&self.normalized.schema)?;

        let mut seen = HashSet::new();
        for company in &self.companies {
            validate_company(company)?;
            if !seen.insert(company.id.as_str()) {
                return Err(ConfigError::DuplicateCompany(company.id.clone()));
            }
        }
        Ok(())
    }

    /// Applies `<ID>_URL` endpoint overrides, e.g. `COMPANY_A_URL` for `company-a`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for company in &mut self.companies {
            let key = url_override_key(&company.id);
            if let Some(url) = lookup(&key).filter(|u| !u.trim().is_empty()) {
                info!("Using {key} for company {}", company.id);
                company.search.api.url = url;
            }
        }
    }

    pub fn companies(&self) -> &[CompanyConfig] {
        &self.companies
    }

    pub fn company(&self, id: &str) -> Option<&CompanyConfig> {
        self.companies.iter().find(|c| c.id == id)
    }

    pub fn normalized(&self) -> &NormalizedSchema {
        &self.normalized
    }
}

/// Environment variable that overrides a provider's search URL.
pub fn url_override_key(id: &str) -> String {
    let upper: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{upper}_URL")
}

fn validate_company(company: &CompanyConfig) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidCompany {
        id: company.id.clone(),
        reason,
    };

    if company.id.trim().is_empty() {
        return Err(invalid("id must not be empty".to_string()));
    }
    if company.search.api.url.trim().is_empty() {
        return Err(invalid("search.api.url must not be empty".to_string()));
    }
    CompiledSchema::compile(&company.search.schema)
        .map_err(|e| invalid(format!("search.schema: {e}")))?;
    if let Some(target) = &company.search.target_schema {
        CompiledSchema::compile(target)
            .and_then(|_| require_top_level_keys(target))
            .map_err(|e| invalid(format!("search.target_schema: {e}")))?;
    }
    Ok(())
}

fn validate_normalized_schema(schema: &Value) -> Result<(), ConfigError> {
    CompiledSchema::compile(schema)
        .and_then(|_| require_top_level_keys(schema))
        .map_err(ConfigError::InvalidNormalizedSchema)
}

fn require_top_level_keys(schema: &Value) -> Result<(), String> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|keys| keys.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let missing: Vec<&str> = REQUIRED_TOP_LEVEL_KEYS
        .iter()
        .copied()
        .filter(|key| !required.contains(key))
        .collect();
    if !missing.is_empty() {
        return Err(format!("required must include {}", missing.join(", ")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry_json(companies: Value, normalized: Value) -> String {
        json!({
            "companies": companies,
            "normalized_data": {"version": "1.0.0", "schema": normalized}
        })
        .to_string()
    }

    fn company(id: &str) -> Value {
        json!({
            "id": id,
            "search": {
                "api": {"url": format!("http://localhost/{id}")},
                "schema": {"type": "object"}
            }
        })
    }

    fn normalized() -> Value {
        crate::testing::normalized_schema()
    }

    #[test]
    fn test_builtin_registry_loads_both_demo_companies() {
        let registry = Registry::builtin().unwrap();
        let ids: Vec<&str> = registry.companies().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["company-a", "company-b"]);
        assert_eq!(registry.normalized().version, "1.0.0");

        let a = registry.company("company-a").unwrap();
        assert_eq!(a.search.result_path, "result.jobs");
        assert_eq!(a.search.api.params_key.as_deref(), Some("request"));
    }

    #[test]
    fn test_builtin_companies_map_onto_shared_schema() {
        let registry = Registry::builtin().unwrap();
        let b = registry.company("company-b").unwrap();
        let shared = &registry.normalized().schema;
        assert!(b.search.schema["properties"].get("organization").is_some());
        assert_eq!(b.search.target_schema(Some(shared)), shared);
        assert!(registry.company("unknown").is_none());
    }

    #[test]
    fn test_target_schema_override_is_accepted() {
        let mut override_schema = normalized();
        override_schema["title"] = json!("acme-only");
        let mut c = company("acme");
        c["search"]["target_schema"] = override_schema;
        let registry =
            Registry::from_json(&registry_json(json!([c, company("globex")]), normalized()))
                .unwrap();

        let shared = &registry.normalized().schema;
        let acme = registry.company("acme").unwrap();
        assert_eq!(acme.search.target_schema(Some(shared))["title"], "acme-only");
        let globex = registry.company("globex").unwrap();
        assert_eq!(globex.search.target_schema(Some(shared)), shared);
    }

    #[test]
    fn test_override_without_core_sections_fails_fast() {
        let mut c = company("acme");
        c["search"]["target_schema"] = json!({
            "type": "object",
            "properties": {"job": {"type": "object"}},
            "required": ["job"]
        });
        let err = Registry::from_json(&registry_json(json!([c]), normalized())).unwrap_err();

        match err {
            ConfigError::InvalidCompany { id, reason } => {
                assert_eq!(id, "acme");
                assert!(reason.starts_with("search.target_schema"), "{reason}");
                assert!(reason.contains("company, compensation, location"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_ids_fail_fast() {
        let err = Registry::from_json(&registry_json(
            json!([company("acme"), company("acme")]),
            normalized(),
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCompany(id) if id == "acme"));
    }

    #[test]
    fn test_empty_url_fails_fast() {
        let mut c = company("acme");
        c["search"]["api"]["url"] = json!("  ");
        let err = Registry::from_json(&registry_json(json!([c]), normalized())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCompany { id, .. } if id == "acme"));
    }

    #[test]
    fn test_malformed_raw_schema_fails_fast() {
        let mut c = company("acme");
        c["search"]["schema"] = json!("not a schema");
        let err = Registry::from_json(&registry_json(json!([c]), normalized())).unwrap_err();
        assert!(err.to_string().contains("search.schema"));
    }

    #[test]
    fn test_normalized_schema_must_require_core_sections() {
        let mut schema = normalized();
        schema["required"] = json!(["job", "company"]);
        let err =
            Registry::from_json(&registry_json(json!([company("acme")]), schema)).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("compensation") && msg.contains("location"), "{msg}");
    }

    #[test]
    fn test_missing_normalized_block_is_a_parse_error() {
        let err = Registry::from_json(r#"{"companies": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_override_replaces_url() {
        let mut registry = Registry::builtin().unwrap();
        registry.apply_env_overrides(|key| match key {
            "COMPANY_A_URL" => Some("http://provider-a:3000/api/jobs/search".to_string()),
            "COMPANY_B_URL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(
            registry.company("company-a").unwrap().search.api.url,
            "http://provider-a:3000/api/jobs/search"
        );
        assert_eq!(
            registry.company("company-b").unwrap().search.api.url,
            "http://localhost:4000/api/jobs/search"
        );
    }

    #[test]
    fn test_url_override_key() {
        assert_eq!(url_override_key("company-a"), "COMPANY_A_URL");
        assert_eq!(url_override_key("acme.io"), "ACME_IO_URL");
    }

    #[test]
    fn test_from_path_reports_missing_file() {
        let err = Registry::from_path(Path::new("/nonexistent/companies.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
