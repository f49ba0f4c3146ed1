use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which backend performs the Transformation Step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformerBackend {
    Llm,
    Mock,
}

impl FromStr for TransformerBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "llm" => Ok(Self::Llm),
            "mock" => Ok(Self::Mock),
            other => bail!("TRANSFORMER must be 'llm' or 'mock', got '{other}'"),
        }
    }
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub transformer: TransformerBackend,
    pub anthropic_api_key: Option<String>,
    pub database_url: Option<String>,
    pub companies_config: Option<PathBuf>,
    pub output_path: PathBuf,
    pub transform_timeout: Duration,
    pub fetch_timeout: Duration,
    pub provider_concurrency: usize,
    pub record_concurrency: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let transformer = match get("TRANSFORMER") {
            Some(v) => v.parse()?,
            None => TransformerBackend::Llm,
        };
        let anthropic_api_key = get("ANTHROPIC_API_KEY");
        if transformer == TransformerBackend::Llm && anthropic_api_key.is_none() {
            bail!(
                "Required environment variable 'ANTHROPIC_API_KEY' is not set \
                 (or use TRANSFORMER=mock)"
            );
        }

        Ok(Config {
            transformer,
            anthropic_api_key,
            database_url: get("DATABASE_URL"),
            companies_config: get("COMPANIES_CONFIG").map(PathBuf::from),
            output_path: get("OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output.jsonl")),
            transform_timeout: Duration::from_secs(parse_positive(
                "TRANSFORM_TIMEOUT_SECS",
                get("TRANSFORM_TIMEOUT_SECS"),
                60,
            )?),
            fetch_timeout: Duration::from_secs(parse_positive(
                "FETCH_TIMEOUT_SECS",
                get("FETCH_TIMEOUT_SECS"),
                30,
            )?),
            provider_concurrency: parse_positive(
                "PROVIDER_CONCURRENCY",
                get("PROVIDER_CONCURRENCY"),
                2,
            )?,
            record_concurrency: parse_positive("RECORD_CONCURRENCY", get("RECORD_CONCURRENCY"), 4)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_positive<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr + PartialEq + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = value else {
        return Ok(default);
    };
    let parsed: T = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got '{raw}'"))?;
    if parsed == T::default() {
        bail!("{key} must be greater than zero");
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_api_key() {
        let config = config(&[("ANTHROPIC_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.transformer, TransformerBackend::Llm);
        assert_eq!(config.output_path, PathBuf::from("output.jsonl"));
        assert_eq!(config.transform_timeout, Duration::from_secs(60));
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.provider_concurrency, 2);
        assert_eq!(config.record_concurrency, 4);
        assert_eq!(config.rust_log, "info");
        assert!(config.database_url.is_none());
        assert!(config.companies_config.is_none());
    }

    #[test]
    fn test_llm_backend_requires_api_key() {
        let err = config(&[]).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_mock_backend_needs_no_api_key() {
        let config = config(&[("TRANSFORMER", "Mock"), ("OUTPUT_PATH", "out/run.jsonl")]).unwrap();
        assert_eq!(config.transformer, TransformerBackend::Mock);
        assert_eq!(config.output_path, PathBuf::from("out/run.jsonl"));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let err = config(&[("TRANSFORMER", "mock"), ("RECORD_CONCURRENCY", "0")]).unwrap_err();
        assert!(err.to_string().contains("RECORD_CONCURRENCY must be greater than zero"));
    }

    #[test]
    fn test_non_numeric_timeout_is_rejected() {
        let err =
            config(&[("TRANSFORMER", "mock"), ("TRANSFORM_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("TRANSFORM_TIMEOUT_SECS"));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let err = config(&[("TRANSFORMER", "gpt")]).unwrap_err();
        assert!(err.to_string().contains("'gpt'"));
    }
}
