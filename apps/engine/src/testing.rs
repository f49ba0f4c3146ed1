//! Test doubles shared by the unit tests.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::adapters::AdapterDeps;
use crate::errors::{SinkError, TransformError};
use crate::models::job::NormalizedJob;
use crate::sink::memory::MemoryJobStore;
use crate::sink::JobSink;
use crate::transform::{Attempt, TransformRequest, TransformationStep, Transformer};

/// Serves `router` on an ephemeral localhost port.
pub async fn serve(router: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

type TransformFn = dyn Fn(&Value, &Attempt) -> Result<String, TransformError> + Send + Sync;

/// Deterministic backend driven by a closure over the parsed raw record.
pub struct StubTransformer {
    f: Box<TransformFn>,
    attempts: Mutex<Vec<Attempt>>,
}

impl StubTransformer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &Attempt) -> Result<String, TransformError> + Send + Sync + 'static,
    {
        Self {
            f: Box::new(f),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Emits a valid normalized document carrying the record's `title`.
    pub fn normalizing() -> Self {
        Self::new(|raw, _| Ok(normalized_for(raw).to_string()))
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transformer for StubTransformer {
    async fn transform(&self, request: &TransformRequest<'_>) -> Result<String, TransformError> {
        self.attempts.lock().unwrap().push(request.attempt.clone());
        let raw: Value = serde_json::from_str(request.data).unwrap();
        (self.f)(&raw, &request.attempt)
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

pub fn normalized_for(raw: &Value) -> Value {
    json!({
        "job": {"title": raw.get("title").cloned().unwrap_or(Value::Null)},
        "company": {"name": "Acme"},
        "compensation": {},
        "location": {}
    })
}

/// Shared normalized schema with the four required top-level sections.
pub fn normalized_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "jobId": {"type": "string"},
            "job": {"type": "object", "properties": {"title": {"type": ["string", "null"]}}},
            "company": {"type": "object"},
            "compensation": {"type": "object"},
            "location": {"type": "object"}
        },
        "required": ["job", "company", "compensation", "location"]
    })
}

/// Sink that rejects the listed job ids and stores everything else.
pub struct FlakySink {
    reject: HashSet<String>,
    pub inner: MemoryJobStore,
}

impl FlakySink {
    pub fn rejecting(ids: &[&str]) -> Self {
        Self {
            reject: ids.iter().map(|s| s.to_string()).collect(),
            inner: MemoryJobStore::new(),
        }
    }
}

#[async_trait]
impl JobSink for FlakySink {
    async fn upsert(&self, job: &NormalizedJob) -> Result<(), SinkError> {
        if self.reject.contains(&job.job_id) {
            return Err(SinkError::Unavailable(format!("write refused for {}", job.job_id)));
        }
        self.inner.upsert(job).await
    }
}

pub fn deps(transformer: Arc<dyn Transformer>, sink: Arc<dyn JobSink>) -> AdapterDeps {
    AdapterDeps {
        step: Arc::new(TransformationStep::new(transformer, Duration::from_secs(5))),
        sink,
        normalized_schema: Some(normalized_schema()),
        http: reqwest::Client::new(),
        record_concurrency: 2,
    }
}
