use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller-supplied search parameters, merged into each provider's request template.
pub type SearchParams = Map<String, Value>;

/// One upstream provider. Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub search: SearchConfig,
}

impl CompanyConfig {
    /// Display name for logs; falls back to the provider id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub api: ApiRequest,
    /// JSON Schema of one raw record as the provider returns it.
    pub schema: Value,
    /// Replaces the shared normalized schema for this provider only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_schema: Option<Value>,
    /// Dot-separated path to the record array inside the response body.
    #[serde(default = "default_result_path")]
    pub result_path: String,
}

impl SearchConfig {
    /// Schema records are mapped onto: the provider's override, else `shared`, else the
    /// provider's own raw schema.
    pub fn target_schema<'a>(&'a self, shared: Option<&'a Value>) -> &'a Value {
        self.target_schema
            .as_ref()
            .or(shared)
            .unwrap_or(&self.schema)
    }
}

fn default_result_path() -> String {
    "result.jobs".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Request template for a provider's search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRequest {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Body template. Ignored for GET.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Body key that receives the search params; the body root when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params_key: Option<String>,
}
