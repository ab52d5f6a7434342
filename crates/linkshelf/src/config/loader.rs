use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// `.yaml`/`.yml` files are YAML, everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content, ConfigFormat::from_path(path))
}

pub fn load_config_from_str(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let config: Config = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
    };

    validate_config(&config)?;

    Ok(config)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(invalid(format!(
            "Unsupported config version: {}",
            config.version
        )));
    }

    if config.worker_count == 0 {
        return Err(invalid("worker_count must be greater than 0"));
    }

    if config.fetch.timeout_secs == 0 {
        return Err(invalid("fetch.timeout_secs must be greater than 0"));
    }
    if config.fetch.max_body_bytes == 0 {
        return Err(invalid("fetch.max_body_bytes must be greater than 0"));
    }

    let ai = &config.ai;
    if !(ai.base_url.starts_with("http://") || ai.base_url.starts_with("https://")) {
        return Err(invalid(format!(
            "ai.base_url must be an http(s) URL, got '{}'",
            ai.base_url
        )));
    }
    if ai.model.trim().is_empty() {
        return Err(invalid("ai.model must not be empty"));
    }
    if !ai.api_key.is_configured() {
        return Err(invalid("ai.api_key needs one of value, file or env"));
    }
    if ai.max_tokens == 0 {
        return Err(invalid("ai.max_tokens must be greater than 0"));
    }
    if !(0.0..=2.0).contains(&ai.temperature) {
        return Err(invalid(format!(
            "ai.temperature must be between 0.0 and 2.0, got {}",
            ai.temperature
        )));
    }
    if ai.timeout_secs == 0 {
        return Err(invalid("ai.timeout_secs must be greater than 0"));
    }
    if ai.retry.max_attempts == 0 {
        return Err(invalid("ai.retry.max_attempts must be at least 1"));
    }
    if ai.retry.initial_backoff_ms > ai.retry.max_backoff_ms {
        return Err(invalid(
            "ai.retry.initial_backoff_ms must not exceed ai.retry.max_backoff_ms",
        ));
    }

    let enrichment = &config.enrichment;
    if enrichment.excerpt_chars == 0 {
        return Err(invalid("enrichment.excerpt_chars must be greater than 0"));
    }
    if enrichment.error_max_chars == 0 {
        return Err(invalid("enrichment.error_max_chars must be greater than 0"));
    }
    if enrichment.tag_count == 0 {
        return Err(invalid("enrichment.tag_count must be greater than 0"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_minimal_json_uses_defaults() {
        let config = load_config_from_str("{}", ConfigFormat::Json).unwrap();
        assert_eq!(config.version, "1.0");
        assert!(config.worker_count > 0);
        assert_eq!(config.fetch.timeout_secs, 20);
        assert_eq!(config.ai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.ai.api_key.env.as_deref(), Some("OPENAI_API_KEY"));
        assert!((config.ai.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.ai.retry.max_attempts, 1);
        assert_eq!(config.enrichment.excerpt_chars, 10_000);
        assert_eq!(config.enrichment.error_max_chars, 500);
        assert_eq!(config.enrichment.tag_count, 6);
    }

    #[test]
    fn test_load_full_json() {
        let config_json = r#"
        {
            "version": "1.0",
            "database_path": "/var/lib/linkshelf/db.sqlite",
            "worker_count": 3,
            "fetch": { "timeout_secs": 5, "user_agent": "test-agent" },
            "ai": {
                "base_url": "http://localhost:11434/v1",
                "model": "llama3",
                "api_key": { "file": "/run/secrets/key" },
                "max_tokens": 256,
                "temperature": 0.1,
                "retry": { "max_attempts": 3, "initial_backoff_ms": 100, "max_backoff_ms": 1000 }
            },
            "enrichment": { "excerpt_chars": 4000 }
        }
        "#;

        let config = load_config_from_str(config_json, ConfigFormat::Json).unwrap();
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.fetch.user_agent, "test-agent");
        assert_eq!(config.ai.model, "llama3");
        assert_eq!(config.ai.api_key.file.as_deref(), Some("/run/secrets/key"));
        assert!(config.ai.api_key.env.is_none());
        assert_eq!(config.ai.retry.max_attempts, 3);
        assert_eq!(config.enrichment.excerpt_chars, 4000);
        assert_eq!(config.enrichment.tag_count, 6);
        assert_eq!(
            config.database_path().unwrap().to_string_lossy(),
            "/var/lib/linkshelf/db.sqlite"
        );
    }

    #[test]
    fn test_load_yaml() {
        let yaml = r#"
worker_count: 2
ai:
  model: gpt-4o
  temperature: 0.2
enrichment:
  tag_count: 4
"#;
        let config = load_config_from_str(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.ai.model, "gpt-4o");
        assert_eq!(config.enrichment.tag_count, 4);
    }

    #[test]
    fn test_load_config_from_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "worker_count: 5").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.worker_count, 5);
    }

    #[test]
    fn test_api_key_without_source_is_rejected() {
        let json = r#"{ "ai": { "api_key": {} } }"#;
        let result = load_config_from_str(json, ConfigFormat::Json);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/linkshelf.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{ not json", ConfigFormat::Json);
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let result = load_config_from_str(r#"{"version": "2.0"}"#, ConfigFormat::Json);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_zero_workers() {
        let result = load_config_from_str(r#"{"worker_count": 0}"#, ConfigFormat::Json);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let result =
            load_config_from_str(r#"{"ai": {"base_url": "ftp://x"}}"#, ConfigFormat::Json);
        match result {
            Err(ConfigError::Validation { message }) => assert!(message.contains("base_url")),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let result = load_config_from_str(r#"{"ai": {"temperature": 3.5}}"#, ConfigFormat::Json);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_zero_retry_attempts() {
        let result = load_config_from_str(
            r#"{"ai": {"retry": {"max_attempts": 0}}}"#,
            ConfigFormat::Json,
        );
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/config.YAML")),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.json")),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config")),
            ConfigFormat::Json
        );
    }
}
