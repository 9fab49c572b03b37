//! Configuration loading, validation, and management for Campanile.
//!
//! Loads configuration from `~/.campanile/config.toml` with environment
//! variable overrides. Validates all settings at startup so bad values
//! fail loudly instead of surfacing mid-conversation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.campanile/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model provider settings (API key, models, timeouts)
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Retrieval settings (top-k, similarity threshold)
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Context assembly settings
    #[serde(default)]
    pub context: ContextConfig,

    /// FAQ cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Conversation memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Document ingestion settings
    #[serde(default)]
    pub ingestion: IngestionConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key for the Gemini API. Overridable via `CAMPANILE_API_KEY`
    /// or `GEMINI_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry attempts for transient provider failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff between retries, scaled linearly by attempt number
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_generation_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_embedding_model() -> String {
    "gemini-embedding-001".into()
}
fn default_embedding_dimension() -> usize {
    768
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_output_tokens() -> u32 {
    1024
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    500
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            generation_model: default_generation_model(),
            embedding_model: default_embedding_model(),
            embedding_dimension: default_embedding_dimension(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("generation_model", &self.generation_model)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dimension", &self.embedding_dimension)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a chunk to count as relevant
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

fn default_top_k() -> usize {
    5
}
fn default_similarity_threshold() -> f32 {
    0.7
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum assembled context length, in Unicode characters
    #[serde(default = "default_max_context_length")]
    pub max_context_length: usize,
}

fn default_max_context_length() -> usize {
    8000
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_length: default_max_context_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached FAQ entries
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Minimum cosine similarity for a cache hit. Stricter than the
    /// retrieval threshold: a near-paraphrase, not a related topic.
    #[serde(default = "default_cache_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Entry lifetime in hours
    #[serde(default = "default_cache_ttl_hours")]
    pub ttl_hours: u64,
}

fn default_cache_capacity() -> usize {
    1000
}
fn default_cache_similarity_threshold() -> f32 {
    0.92
}
fn default_cache_ttl_hours() -> u64 {
    24
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            similarity_threshold: default_cache_similarity_threshold(),
            ttl_hours: default_cache_ttl_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Turns retained per session (user and assistant counted separately)
    #[serde(default = "default_memory_window")]
    pub window: usize,

    /// Idle minutes before a session expires
    #[serde(default = "default_session_timeout_minutes")]
    pub session_timeout_minutes: u64,

    /// Optional SQLite file for the conversation archive.
    /// None disables archiving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<String>,
}

fn default_memory_window() -> usize {
    10
}
fn default_session_timeout_minutes() -> u64 {
    60
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window: default_memory_window(),
            session_timeout_minutes: default_session_timeout_minutes(),
            archive_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    50
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.campanile/config.toml),
    /// or from `CAMPANILE_CONFIG` if set.
    ///
    /// Environment variables override file values:
    /// - `CAMPANILE_API_KEY` / `GEMINI_API_KEY`
    /// - `CAMPANILE_MODEL`, `CAMPANILE_EMBEDDING_MODEL`
    /// - `TOP_K_RESULTS`, `SIMILARITY_THRESHOLD`, `MAX_CONTEXT_LENGTH`
    /// - `FAQ_CACHE_CAPACITY`, `FAQ_SIMILARITY_THRESHOLD`, `FAQ_CACHE_TTL_HOURS`
    /// - `MEMORY_WINDOW`, `CHUNK_SIZE`, `CHUNK_OVERLAP`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = match std::env::var("CAMPANILE_CONFIG") {
            Ok(p) => PathBuf::from(p),
            Err(_) => Self::config_dir().join("config.toml"),
        };
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides (highest priority).
    fn apply_env_overrides(&mut self) {
        if let Some(key) = std::env::var("CAMPANILE_API_KEY")
            .ok()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
        {
            self.provider.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("CAMPANILE_MODEL") {
            self.provider.generation_model = model;
        }
        if let Ok(model) = std::env::var("CAMPANILE_EMBEDDING_MODEL") {
            self.provider.embedding_model = model;
        }

        if let Some(v) = env_parse("TOP_K_RESULTS") {
            self.retrieval.top_k = v;
        }
        if let Some(v) = env_parse("SIMILARITY_THRESHOLD") {
            self.retrieval.similarity_threshold = v;
        }
        if let Some(v) = env_parse("MAX_CONTEXT_LENGTH") {
            self.context.max_context_length = v;
        }
        if let Some(v) = env_parse("FAQ_CACHE_CAPACITY") {
            self.cache.capacity = v;
        }
        if let Some(v) = env_parse("FAQ_SIMILARITY_THRESHOLD") {
            self.cache.similarity_threshold = v;
        }
        if let Some(v) = env_parse("FAQ_CACHE_TTL_HOURS") {
            self.cache.ttl_hours = v;
        }
        if let Some(v) = env_parse("MEMORY_WINDOW") {
            self.memory.window = v;
        }
        if let Some(v) = env_parse("CHUNK_SIZE") {
            self.ingestion.chunk_size = v;
        }
        if let Some(v) = env_parse("CHUNK_OVERLAP") {
            self.ingestion.chunk_overlap = v;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".campanile")
    }

    /// Get the default data directory (corpus files, archive database).
    pub fn data_dir() -> PathBuf {
        Self::config_dir().join("data")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.provider.embedding_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "provider.embedding_dimension must be at least 1".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be at least 1".into(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.retrieval.similarity_threshold) {
            return Err(ConfigError::ValidationError(
                "retrieval.similarity_threshold must be between -1.0 and 1.0".into(),
            ));
        }
        if self.context.max_context_length == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_context_length must be at least 1".into(),
            ));
        }
        if self.cache.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "cache.capacity must be at least 1".into(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.cache.similarity_threshold) {
            return Err(ConfigError::ValidationError(
                "cache.similarity_threshold must be between -1.0 and 1.0".into(),
            ));
        }
        if self.memory.window == 0 {
            return Err(ConfigError::ValidationError(
                "memory.window must be at least 1".into(),
            ));
        }
        if self.ingestion.chunk_overlap >= self.ingestion.chunk_size {
            return Err(ConfigError::ValidationError(
                "ingestion.chunk_overlap must be smaller than chunk_size".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Return the API key, or fail. Provider construction calls this so
    /// a missing key is fatal at startup rather than at first request.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.provider.api_key.as_deref().ok_or_else(|| {
            ConfigError::ValidationError(
                "no API key configured; set CAMPANILE_API_KEY or GEMINI_API_KEY".into(),
            )
        })
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            retrieval: RetrievalConfig::default(),
            context: ContextConfig::default(),
            cache: CacheConfig::default(),
            memory: MemoryConfig::default(),
            ingestion: IngestionConfig::default(),
        }
    }
}

/// Parse a numeric environment variable, warning on garbage values.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring {name}={raw}: not a valid value");
            None
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
