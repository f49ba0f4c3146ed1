use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::models::job::FailureStage;

/// Registry and adapter-resolution errors. Fatal for the provider they name only.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read registry file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse registry: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate company id '{0}'")]
    DuplicateCompany(String),

    #[error("Invalid config for company '{id}': {reason}")]
    InvalidCompany { id: String, reason: String },

    #[error("Invalid normalized schema: {0}")]
    InvalidNormalizedSchema(String),

    #[error("No adapter registered for company: {0}")]
    AdapterMissing(String),

    #[error("Adapter built for '{expected}' reports provider '{actual}'")]
    ProviderMismatch { expected: String, actual: String },
}

/// Failure reaching a provider or reading its search response. No partial record list
/// is ever returned alongside one of these.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("[{provider}] request failed: {source}")]
    Http {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("[{provider}] returned status {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("[{provider}] response is not valid JSON: {source}")]
    Decode {
        provider: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("[{provider}] rejected the search: {message}")]
    Rejected { provider: String, message: String },

    #[error("[{provider}] no record array at '{path}'")]
    MissingRecords { provider: String, path: String },

    #[error("[{provider}] invalid request template: {reason}")]
    InvalidRequest { provider: String, reason: String },
}

impl FetchError {
    pub fn provider(&self) -> &str {
        match self {
            FetchError::Http { provider, .. }
            | FetchError::Status { provider, .. }
            | FetchError::Decode { provider, .. }
            | FetchError::Rejected { provider, .. }
            | FetchError::MissingRecords { provider, .. }
            | FetchError::InvalidRequest { provider, .. } => provider,
        }
    }
}

/// Failure of the Transformation Step for a single record.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Transformation backend failed: {0}")]
    Backend(String),

    #[error("Transformation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Output is not a bare JSON document: {0}")]
    NotJson(String),

    #[error("Output is a JSON {0}, expected an object")]
    NotObject(&'static str),

    #[error("Output failed schema validation: {}", .0.join("; "))]
    Schema(Vec<String>),
}

impl TransformError {
    /// Contract violations get one more attempt with the stricter prompt.
    /// Backend failures and timeouts do not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransformError::NotJson(_) | TransformError::NotObject(_) | TransformError::Schema(_)
        )
    }

    pub fn stage(&self) -> FailureStage {
        match self {
            TransformError::Backend(_) => FailureStage::Transform,
            TransformError::Timeout(_) => FailureStage::Timeout,
            TransformError::NotJson(_) | TransformError::NotObject(_) => FailureStage::Parse,
            TransformError::Schema(_) => FailureStage::Validate,
        }
    }
}

/// Failure writing one normalized record to the document store.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode job document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Engine-level error covering the whole taxonomy.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}
