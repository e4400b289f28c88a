use crate::error::VecSearchError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default minimum similarity for a document to be returned
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;

/// Default maximum number of returned documents
pub const DEFAULT_TOP_K: usize = 10;

/// What to do with a stored record whose embedding dimension differs from the query's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Skip the record, log a warning and keep ranking the rest
    #[default]
    Skip,

    /// Fail the whole query with `DimensionMismatch`
    Abort,
}

impl FromStr for MismatchPolicy {
    type Err = VecSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" | "warn" => Ok(Self::Skip),
            "abort" | "fatal" => Ok(Self::Abort),
            other => Err(VecSearchError::config(format!(
                "Unknown dimension mismatch policy '{}' (expected skip or abort)",
                other
            ))),
        }
    }
}

/// Ranking defaults applied when a query does not override them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchDefaults {
    pub threshold: f32,
    pub top_k: usize,
    pub mismatch_policy: MismatchPolicy,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            mismatch_policy: MismatchPolicy::default(),
        }
    }
}

/// vecsearch application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Embedding API base URL
    pub embedding_api_url: String,

    /// Per-call embedding timeout (seconds)
    pub embedding_timeout_secs: u64,

    /// Attempts per embedding call (1 = no retry)
    pub embedding_max_attempts: u32,

    /// Document store file path
    pub store_path: PathBuf,

    /// Per-call document store timeout (seconds)
    pub store_timeout_secs: u64,

    /// Default similarity threshold
    pub similarity_threshold: f32,

    /// Default result count bound
    pub top_k: usize,

    /// Dimension mismatch handling
    pub mismatch_policy: MismatchPolicy,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            embedding_api_url: "http://localhost:8000".to_string(),
            embedding_timeout_secs: 30,
            embedding_max_attempts: 1,
            store_path: PathBuf::from("./db/documents.json"),
            store_timeout_secs: 10,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            mismatch_policy: MismatchPolicy::Skip,
            log_dir: PathBuf::from("./db/log"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, VecSearchError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a key lookup, defaulting only absent keys
    ///
    /// A key that is present but does not parse is a `Config` error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, VecSearchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            embedding_api_url: lookup("EMBEDDING_API_URL").unwrap_or(defaults.embedding_api_url),
            embedding_timeout_secs: parse_var(&lookup, "EMBEDDING_TIMEOUT_SECS")?
                .unwrap_or(defaults.embedding_timeout_secs),
            embedding_max_attempts: parse_var(&lookup, "EMBEDDING_MAX_ATTEMPTS")?
                .unwrap_or(defaults.embedding_max_attempts),
            store_path: lookup("STORE_PATH").map(PathBuf::from).unwrap_or(defaults.store_path),
            store_timeout_secs: parse_var(&lookup, "STORE_TIMEOUT_SECS")?
                .unwrap_or(defaults.store_timeout_secs),
            similarity_threshold: parse_var(&lookup, "SIMILARITY_THRESHOLD")?
                .unwrap_or(defaults.similarity_threshold),
            top_k: parse_var(&lookup, "TOP_K")?.unwrap_or(defaults.top_k),
            mismatch_policy: parse_var(&lookup, "DIMENSION_MISMATCH_POLICY")?
                .unwrap_or(defaults.mismatch_policy),
            log_dir: lookup("LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;

        Ok(config)
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding_timeout_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// Ranking defaults derived from this configuration
    pub fn search_defaults(&self) -> SearchDefaults {
        SearchDefaults {
            threshold: self.similarity_threshold,
            top_k: self.top_k,
            mismatch_policy: self.mismatch_policy,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), VecSearchError> {
        if !self.embedding_api_url.starts_with("http://")
            && !self.embedding_api_url.starts_with("https://") {
            return Err(VecSearchError::config(
                "Embedding API URL must start with http:// or https://"
            ));
        }

        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(VecSearchError::config(format!(
                "Similarity threshold must be within [-1, 1], got {}",
                self.similarity_threshold
            )));
        }

        if self.top_k == 0 {
            return Err(VecSearchError::config("top_k must be at least 1"));
        }

        if self.embedding_timeout_secs == 0 || self.store_timeout_secs == 0 {
            return Err(VecSearchError::config("Timeouts must be greater than 0"));
        }

        if self.embedding_max_attempts == 0 {
            return Err(VecSearchError::config(
                "Embedding max attempts must be at least 1"
            ));
        }

        Ok(())
    }
}

/// Parse an optional variable; `Ok(None)` only when the key is absent
fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, VecSearchError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|e| {
            VecSearchError::config(format!("Invalid value for {}: '{}' ({})", key, raw, e))
        }),
    }
}
