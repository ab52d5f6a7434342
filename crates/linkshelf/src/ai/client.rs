//! Chat-completions client for OpenAI-compatible endpoints.

use std::time::Duration;

use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::AiServiceError;
use crate::config::AiConfig;
use crate::sanitize::truncate_chars;

/// One system + user exchange with a language model.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, system: &str, user: &str) -> Result<String, AiServiceError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct OpenAiClient {
    http: Client,
    endpoint: String,
    api_key: SecretString,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(config: &AiConfig, api_key: SecretString) -> Result<Self, AiServiceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AiServiceError::Client(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Builds a client, resolving the API key from the configured source.
    pub fn from_config(config: &AiConfig) -> crate::Result<Self> {
        let api_key = config.api_key.resolve()?;
        Ok(Self::new(config, api_key)?)
    }

    fn api_error(status: u16, body: &str) -> AiServiceError {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| truncate_chars(body.trim(), 200).to_string());
        AiServiceError::Api { status, message }
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, system: &str, user: &str) -> Result<String, AiServiceError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        log::debug!(
            "Requesting completion from {} (model {}, {} input chars)",
            self.endpoint,
            self.model,
            user.chars().count()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() {
                    AiServiceError::Timeout(e.to_string())
                } else {
                    AiServiceError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().map_err(|e| {
            let e = e.without_url();
            if e.is_timeout() {
                AiServiceError::Timeout(e.to_string())
            } else {
                AiServiceError::Transport(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(Self::api_error(status.as_u16(), &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| AiServiceError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AiServiceError::MissingContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubServer;

    fn client_for(server: &StubServer, timeout_secs: u64) -> OpenAiClient {
        let config = AiConfig {
            base_url: server.url("/v1/"),
            model: "test-model".to_string(),
            timeout_secs,
            ..AiConfig::default()
        };
        OpenAiClient::new(&config, SecretString::from("sk-test".to_string())).unwrap()
    }

    #[test]
    fn test_complete_returns_first_choice() {
        let server = StubServer::respond(
            200,
            "application/json",
            r#"{"choices":[{"message":{"role":"assistant","content":"A summary."}}]}"#,
        );
        let client = client_for(&server, 5);

        let text = client.complete("system prompt", "page text").unwrap();
        assert_eq!(text, "A summary.");

        let request = server.captured_request().unwrap();
        assert!(request.starts_with("POST /v1/chat/completions "));
        assert!(request.contains("Bearer sk-test"));
        assert!(request.contains(r#""model":"test-model""#));
        assert!(request.contains(r#""role":"system","content":"system prompt""#));
        assert!(request.contains(r#""role":"user","content":"page text""#));
    }

    #[test]
    fn test_complete_api_error_message() {
        let server = StubServer::respond(
            401,
            "application/json",
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        );
        let client = client_for(&server, 5);

        let err = client.complete("s", "u").unwrap_err();
        assert_eq!(
            err,
            AiServiceError::Api {
                status: 401,
                message: "Incorrect API key provided".to_string()
            }
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_complete_server_error_is_retryable() {
        let server = StubServer::respond(503, "text/plain", "upstream unavailable");
        let client = client_for(&server, 5);

        let err = client.complete("s", "u").unwrap_err();
        assert!(matches!(
            err,
            AiServiceError::Api { status: 503, ref message } if message == "upstream unavailable"
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_complete_malformed_body() {
        let server = StubServer::respond(200, "application/json", "not json");
        let client = client_for(&server, 5);

        let err = client.complete("s", "u").unwrap_err();
        assert!(matches!(err, AiServiceError::MalformedResponse(_)));
    }

    #[test]
    fn test_complete_missing_content() {
        let server = StubServer::respond(
            200,
            "application/json",
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
        );
        let client = client_for(&server, 5);
        assert_eq!(
            client.complete("s", "u").unwrap_err(),
            AiServiceError::MissingContent
        );

        let server = StubServer::respond(200, "application/json", r#"{"choices":[]}"#);
        let client = client_for(&server, 5);
        assert_eq!(
            client.complete("s", "u").unwrap_err(),
            AiServiceError::MissingContent
        );
    }

    #[test]
    fn test_complete_timeout() {
        let server = StubServer::delayed(
            Duration::from_secs(3),
            200,
            "application/json",
            r#"{"choices":[]}"#,
        );
        let client = client_for(&server, 1);

        let err = client.complete("s", "u").unwrap_err();
        assert!(matches!(err, AiServiceError::Timeout(_)), "got {:?}", err);
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let server = StubServer::respond(200, "application/json", "{}");
        let client = client_for(&server, 5);
        assert!(!format!("{:?}", client).contains("sk-test"));
    }
}
