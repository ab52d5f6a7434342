use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::secrets::SecretSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    /// SQLite database file. Defaults to `~/.linkshelf/data/linkshelf.db`.
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            database_path: None,
            worker_count: default_worker_count(),
            fetch: FetchConfig::default(),
            ai: AiConfig::default(),
            enrichment: EnrichmentConfig::default(),
        }
    }
}

impl Config {
    /// Configured database path, or the per-user default.
    pub fn database_path(&self) -> Option<PathBuf> {
        match &self.database_path {
            Some(path) => Some(PathBuf::from(path)),
            None => crate::db::default_database_path(),
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_fetch_timeout_secs() -> u64 {
    20
}

fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible; linkshelf/{}; +https://github.com/iperka/linkshelf)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_max_body_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Settings for the OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key")]
    pub api_key: SecretSource,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key() -> SecretSource {
    SecretSource::from_env("OPENAI_API_KEY")
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.3
}

fn default_ai_timeout_secs() -> u64 {
    60
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: default_api_key(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_ai_timeout_secs(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry policy for completion calls. One attempt means no retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    8_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Characters of normalized text sent to the model.
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
    /// Upper bound for the persisted `ai_error` message.
    #[serde(default = "default_error_max_chars")]
    pub error_max_chars: usize,
    #[serde(default = "default_tag_count")]
    pub tag_count: usize,
}

fn default_excerpt_chars() -> usize {
    10_000
}

fn default_error_max_chars() -> usize {
    500
}

fn default_tag_count() -> usize {
    6
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: default_excerpt_chars(),
            error_max_chars: default_error_max_chars(),
            tag_count: default_tag_count(),
        }
    }
}
