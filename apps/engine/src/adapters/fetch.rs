//! HTTP fetch of a provider's raw records, driven by its `SearchConfig`.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::errors::FetchError;
use crate::models::company::{ApiRequest, HttpMethod, SearchConfig, SearchParams};
use crate::models::job::RawJob;

const ERROR_BODY_EXCERPT: usize = 512;

/// Calls the provider's search endpoint and returns the record array found at
/// `search.result_path`.
pub async fn fetch_raw_jobs(
    http: &reqwest::Client,
    provider: &str,
    search: &SearchConfig,
    params: &SearchParams,
) -> Result<Vec<RawJob>, FetchError> {
    let api = &search.api;
    let mut request = http.request(api.method.into(), &api.url);
    for (name, value) in &api.headers {
        request = request.header(name.as_str(), value.as_str());
    }
    request = match api.method {
        HttpMethod::Get => request.query(&query_pairs(params)),
        _ => request.json(&build_body(provider, api, params)?),
    };

    debug!("[{provider}] {:?} {}", api.method, api.url);
    let response = request.send().await.map_err(|source| FetchError::Http {
        provider: provider.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            provider: provider.to_string(),
            status: status.as_u16(),
            body: excerpt(&body),
        });
    }

    let text = response.text().await.map_err(|source| FetchError::Http {
        provider: provider.to_string(),
        source,
    })?;
    let mut body: Value = serde_json::from_str(&text).map_err(|source| FetchError::Decode {
        provider: provider.to_string(),
        source,
    })?;

    if let Some(message) = envelope_failure(&body) {
        return Err(FetchError::Rejected {
            provider: provider.to_string(),
            message,
        });
    }

    let jobs = match body.pointer_mut(&json_pointer(&search.result_path)).map(Value::take) {
        Some(Value::Array(jobs)) => jobs,
        _ => {
            return Err(FetchError::MissingRecords {
                provider: provider.to_string(),
                path: search.result_path.clone(),
            })
        }
    };

    info!("[{provider}] Fetched {} raw jobs", jobs.len());
    Ok(jobs)
}

/// Body template with `params` shallow-merged at `params_key`, or at the root.
fn build_body(
    provider: &str,
    api: &ApiRequest,
    params: &SearchParams,
) -> Result<Value, FetchError> {
    let mut body = api.data.clone().unwrap_or_else(|| Value::Object(Map::new()));
    if params.is_empty() {
        return Ok(body);
    }

    let invalid = |reason: &str| FetchError::InvalidRequest {
        provider: provider.to_string(),
        reason: reason.to_string(),
    };
    let root = body
        .as_object_mut()
        .ok_or_else(|| invalid("body template must be a JSON object"))?;
    let target = match &api.params_key {
        Some(key) => root
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| invalid("params_key must point at a JSON object"))?,
        None => root,
    };
    target.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
    Ok(body)
}

fn query_pairs(params: &SearchParams) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}

/// Error message of a `{"params": {"status": "FAILED", "errmsg": ...}}` envelope.
fn envelope_failure(body: &Value) -> Option<String> {
    let params = body.get("params")?;
    if params.get("status").and_then(Value::as_str) != Some("FAILED") {
        return None;
    }
    let message = ["errmsg", "err"]
        .iter()
        .find_map(|key| params.get(*key).and_then(Value::as_str))
        .unwrap_or("status FAILED");
    Some(message.to_string())
}

/// `result.jobs` -> `/result/jobs`. An empty path addresses the body root.
fn json_pointer(path: &str) -> String {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
        .collect()
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_EXCERPT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
