//! Runtime configuration read from the environment.
//!
//! Required credentials are checked together so a misconfigured deployment
//! reports every missing variable at once.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::llm::DEFAULT_OLLAMA_HOST;
use crate::memory::DEFAULT_SIMILARITY_THRESHOLD;
use crate::retriever::{DEFAULT_NUM_RESULTS, DEFAULT_PAGE_TIMEOUT, MAX_RESULTS_PER_REQUEST};

/// Embedding model used when `EMBEDDING_MODEL` is unset.
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";

/// Per-call model timeout used when `MODEL_TIMEOUT_SECS` is unset.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(60);

const REQUIRED: [&str; 5] = [
    "LLM_API_URL",
    "LLM_API_KEY",
    "LLM_MODEL",
    "SEARCH_API_URL",
    "SEARCH_API_KEY",
];

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

/// Fully resolved settings for building a pipeline.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub classifier_model: String,
    pub search_api_url: String,
    pub search_api_key: String,
    pub search_engine_id: Option<String>,
    pub ollama_host: String,
    pub embedding_model: String,
    pub fallback_model: Option<String>,
    pub similarity_threshold: f32,
    pub search_results: usize,
    pub page_timeout: Duration,
    pub model_timeout: Duration,
    pub db_path: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("llm_api_url", &self.llm_api_url)
            .field("llm_model", &self.llm_model)
            .field("classifier_model", &self.classifier_model)
            .field("search_api_url", &self.search_api_url)
            .field("search_engine_id", &self.search_engine_id)
            .field("ollama_host", &self.ollama_host)
            .field("embedding_model", &self.embedding_model)
            .field("fallback_model", &self.fallback_model)
            .field("similarity_threshold", &self.similarity_threshold)
            .field("search_results", &self.search_results)
            .field("page_timeout", &self.page_timeout)
            .field("model_timeout", &self.model_timeout)
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<String> = REQUIRED
            .iter()
            .filter(|&&name| get(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }
        let required = |name: &str| get(name).unwrap_or_default();

        let similarity_threshold = match get("SIMILARITY_THRESHOLD") {
            Some(raw) => parse_threshold("SIMILARITY_THRESHOLD", &raw)?,
            None => DEFAULT_SIMILARITY_THRESHOLD,
        };
        let search_results = match get("SEARCH_RESULTS") {
            Some(raw) => parse_result_count("SEARCH_RESULTS", &raw)?,
            None => DEFAULT_NUM_RESULTS,
        };
        let page_timeout = match get("PAGE_TIMEOUT_SECS") {
            Some(raw) => parse_secs("PAGE_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_PAGE_TIMEOUT,
        };
        let model_timeout = match get("MODEL_TIMEOUT_SECS") {
            Some(raw) => parse_secs("MODEL_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_MODEL_TIMEOUT,
        };

        let llm_model = required("LLM_MODEL");
        Ok(Self {
            llm_api_url: required("LLM_API_URL"),
            llm_api_key: required("LLM_API_KEY"),
            classifier_model: get("CLASSIFIER_MODEL").unwrap_or_else(|| llm_model.clone()),
            llm_model,
            search_api_url: required("SEARCH_API_URL"),
            search_api_key: required("SEARCH_API_KEY"),
            search_engine_id: get("SEARCH_ENGINE_ID"),
            ollama_host: get("OLLAMA_HOST").unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string()),
            embedding_model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            fallback_model: get("FALLBACK_MODEL"),
            similarity_threshold,
            search_results,
            page_timeout,
            model_timeout,
            db_path: get("SIFT_DB_PATH").map(PathBuf::from),
        })
    }

    /// Overrides the similarity threshold after validating it.
    pub fn with_threshold(mut self, threshold: f32) -> Result<Self, ConfigError> {
        self.similarity_threshold = check_threshold("--threshold", threshold)?;
        Ok(self)
    }

    /// Overrides the search result count after validating it.
    pub fn with_search_results(mut self, count: usize) -> Result<Self, ConfigError> {
        self.search_results = check_result_count("--results", count)?;
        Ok(self)
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn parse_threshold(name: &str, raw: &str) -> Result<f32, ConfigError> {
    let value: f32 = raw
        .parse()
        .map_err(|_| invalid(name, format!("'{raw}' is not a number")))?;
    check_threshold(name, value)
}

fn check_threshold(name: &str, value: f32) -> Result<f32, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(invalid(name, format!("{value} is outside [0, 1]")))
    }
}

fn parse_result_count(name: &str, raw: &str) -> Result<usize, ConfigError> {
    let value: usize = raw
        .parse()
        .map_err(|_| invalid(name, format!("'{raw}' is not a positive integer")))?;
    check_result_count(name, value)
}

fn check_result_count(name: &str, value: usize) -> Result<usize, ConfigError> {
    if (1..=MAX_RESULTS_PER_REQUEST).contains(&value) {
        Ok(value)
    } else {
        Err(invalid(
            name,
            format!("{value} is outside 1..={MAX_RESULTS_PER_REQUEST}"),
        ))
    }
}

fn parse_secs(name: &str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(invalid(name, format!("'{raw}' is not a positive number of seconds"))),
    }
}
