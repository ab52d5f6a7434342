use thiserror::Error;

/// Errors from the language-model completion endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AiServiceError {
    #[error("Language model request failed: {0}")]
    Transport(String),

    #[error("Language model request timed out: {0}")]
    Timeout(String),

    #[error("Language model API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse language model response: {0}")]
    MalformedResponse(String),

    #[error("Language model response contained no message content")]
    MissingContent,

    #[error("Language model returned an empty completion")]
    EmptyCompletion,

    #[error("Failed to build language model client: {0}")]
    Client(String),
}

impl AiServiceError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiServiceError::Transport(_) | AiServiceError::Timeout(_) => true,
            AiServiceError::Api { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}
