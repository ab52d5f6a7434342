use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkshelfError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("AI service error: {0}")]
    Ai(#[from] crate::ai::AiServiceError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid bookmark URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Bookmark {0} not found")]
    NotFound(i64),

    #[error("Failed to serialize output: {0}")]
    Output(#[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Failures while retrieving a page. URLs are redacted before they land here.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request to {url} timed out: {message}")]
    Timeout { url: String, message: String },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Response from {url} exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },

    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Markdown conversion failed: {0}")]
    Converter(String),

    #[error("Document contains no extractable text")]
    EmptyDocument,
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Worker pool is shutting down")]
    ShuttingDown,
}

pub type Result<T> = std::result::Result<T, LinkshelfError>;
