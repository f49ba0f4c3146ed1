use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A provider record of unknown shape, exactly as fetched.
pub type RawJob = Value;

/// Raw-record fields tried, in order, when identifying a record in logs and ids.
const RECORD_KEY_FIELDS: &[&str] = &["jobId", "id", "_id"];

/// Audit trail attached to every normalized record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    pub source_id: String,
    pub ingested_at: DateTime<Utc>,
    /// The raw record that produced this job, unmodified.
    pub original_event: RawJob,
}

/// A record conforming to the shared target schema.
///
/// `jobId` is always present; uniqueness downstream is scoped by `metadata.source_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedJob {
    #[serde(rename = "jobId")]
    pub job_id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub metadata: JobMetadata,
}

impl NormalizedJob {
    /// Wraps a transformed document, replacing any `metadata` it carries with the
    /// engine's audit block.
    pub fn new(source_id: &str, mut transformed: Map<String, Value>, raw: RawJob) -> Self {
        transformed.remove("metadata");
        let job_id = transformed
            .remove("jobId")
            .and_then(|v| scalar_to_string(&v))
            .or_else(|| record_key(&raw))
            .unwrap_or_else(|| derived_job_id(source_id, &raw));

        Self {
            job_id,
            fields: transformed,
            metadata: JobMetadata {
                source_id: source_id.to_string(),
                ingested_at: Utc::now(),
                original_event: raw,
            },
        }
    }

    pub fn source_id(&self) -> &str {
        &self.metadata.source_id
    }

    /// The document as written to the store and the export file.
    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Identifying key of a raw record (`jobId`, `id` or `_id`), if it has one.
pub fn record_key(raw: &RawJob) -> Option<String> {
    RECORD_KEY_FIELDS
        .iter()
        .filter_map(|field| raw.get(*field))
        .find_map(scalar_to_string)
}

/// Deterministic id for records without one, so re-ingestion upserts in place.
fn derived_job_id(source_id: &str, raw: &RawJob) -> String {
    let name = format!("{source_id}:{raw}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Where in the per-record pipeline a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Transform,
    Timeout,
    Parse,
    Validate,
    Persist,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureStage::Transform => "transform",
            FailureStage::Timeout => "timeout",
            FailureStage::Parse => "parse",
            FailureStage::Validate => "validate",
            FailureStage::Persist => "persist",
        };
        f.write_str(s)
    }
}

/// A record that did not make it through transform and persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFailure {
    /// Position in the fetched batch.
    pub index: usize,
    pub record_key: Option<String>,
    pub stage: FailureStage,
    pub reason: String,
}

/// Per-provider outcome. `data` is empty, never absent, when the provider failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationResult {
    pub company_id: String,
    pub data: Vec<NormalizedJob>,
    #[serde(default)]
    pub failed_records: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransformationResult {
    pub fn completed(company_id: &str, data: Vec<NormalizedJob>, failed_records: usize) -> Self {
        Self {
            company_id: company_id.to_string(),
            data,
            failed_records,
            error: None,
        }
    }

    pub fn provider_failed(company_id: &str, error: impl ToString) -> Self {
        Self {
            company_id: company_id.to_string(),
            data: Vec::new(),
            failed_records: 0,
            error: Some(error.to_string()),
        }
    }

    pub fn is_provider_failure(&self) -> bool {
        self.error.is_some()
    }
}
