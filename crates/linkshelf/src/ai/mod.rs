//! Language-model integration: summary and tag generation.
//!
//! [`OpenAiClient`] talks to any OpenAI-compatible chat-completions
//! endpoint. [`ContentProcessor`] holds the two fixed prompts and the
//! post-processing of their replies.

mod client;
mod error;
pub mod prompts;
mod processor;
mod retry;

pub use client::{CompletionClient, OpenAiClient};
pub use error::AiServiceError;
pub use processor::{normalize_tag, parse_tags, ContentProcessor};
pub use retry::RetryingClient;

use std::sync::Arc;

use crate::config::AiConfig;

/// Builds the configured client stack: HTTP client wrapped in the retry policy.
pub fn client_from_config(config: &AiConfig) -> crate::Result<Arc<dyn CompletionClient>> {
    let client = OpenAiClient::from_config(config)?;
    log::info!(
        "Using language model '{}' at {} (max {} attempts)",
        config.model,
        config.base_url,
        config.retry.max_attempts
    );
    Ok(Arc::new(RetryingClient::new(client, config.retry.clone())))
}
