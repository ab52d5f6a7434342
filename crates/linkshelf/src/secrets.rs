//! Resolution of credentials (the language-model API key) from config.
//!
//! A secret may be given in three ways, tried in this order:
//!
//! 1. **Direct value** in the config file (`api_key: { value: "sk-..." }`)
//! 2. **File reference** (`api_key: { file: /run/secrets/openai }`), for Docker secrets
//! 3. **Env var reference** (`api_key: { env: OPENAI_API_KEY }`), the default

use std::fs;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("Secret from {origin} is empty")]
    Empty { origin: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// The three places a secret can come from, as written in config files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

impl SecretSource {
    pub fn from_env(name: impl Into<String>) -> Self {
        Self {
            env: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn resolve(&self) -> Result<SecretString> {
        resolve_secret(
            self.value.as_deref(),
            self.file.as_deref(),
            self.env.as_deref(),
        )
    }

    pub fn is_configured(&self) -> bool {
        has_secret_source(
            self.value.as_deref(),
            self.file.as_deref(),
            self.env.as_deref(),
        )
    }
}

/// Resolves a secret from the first configured, non-empty source.
///
/// Values read from files or environment variables are trimmed; a source
/// that resolves to an empty string is an error rather than a silent
/// fall-through, so a blank key file never turns into an unauthenticated
/// request.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = file_path.filter(|p| !p.is_empty()) {
        let expanded = expand_home(path);
        let content = fs::read_to_string(&expanded).map_err(|e| SecretError::FileReadError {
            path: expanded.clone(),
            source: e,
        })?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(SecretError::Empty {
                origin: format!("file '{}'", expanded),
            });
        }
        return Ok(SecretString::from(trimmed.to_string()));
    }

    if let Some(var_name) = env_var.filter(|n| !n.is_empty()) {
        return match std::env::var(var_name) {
            Ok(value) if value.trim().is_empty() => Err(SecretError::Empty {
                origin: format!("environment variable '{}'", var_name),
            }),
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: var_name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: var_name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

pub fn has_secret_source(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> bool {
    direct.is_some_and(|s| !s.is_empty())
        || file_path.is_some_and(|s| !s.is_empty())
        || env_var.is_some_and(|s| !s.is_empty())
}

/// Expands a leading `~` or `~/` to the current user's home directory.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_direct_value_takes_priority() {
        std::env::set_var("LINKSHELF_TEST_KEY_1", "env_value");
        let result =
            resolve_secret(Some("direct_value"), None, Some("LINKSHELF_TEST_KEY_1")).unwrap();
        assert_eq!(result.expose_secret(), "direct_value");
        std::env::remove_var("LINKSHELF_TEST_KEY_1");
    }

    #[test]
    #[serial]
    fn test_file_takes_priority_over_env() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "file_value").unwrap();

        std::env::set_var("LINKSHELF_TEST_KEY_2", "env_value");
        let result = resolve_secret(
            None,
            Some(temp_file.path().to_str().unwrap()),
            Some("LINKSHELF_TEST_KEY_2"),
        )
        .unwrap();
        assert_eq!(result.expose_secret(), "file_value");
        std::env::remove_var("LINKSHELF_TEST_KEY_2");
    }

    #[test]
    #[serial]
    fn test_env_var_fallback_is_trimmed() {
        std::env::set_var("LINKSHELF_TEST_KEY_3", "  sk-test\n");
        let source = SecretSource::from_env("LINKSHELF_TEST_KEY_3");
        assert_eq!(source.resolve().unwrap().expose_secret(), "sk-test");
        std::env::remove_var("LINKSHELF_TEST_KEY_3");
    }

    #[test]
    #[serial]
    fn test_blank_env_var_is_an_error() {
        std::env::set_var("LINKSHELF_TEST_KEY_4", "   ");
        let result = resolve_secret(None, None, Some("LINKSHELF_TEST_KEY_4"));
        assert!(matches!(result, Err(SecretError::Empty { .. })));
        std::env::remove_var("LINKSHELF_TEST_KEY_4");
    }

    #[test]
    fn test_no_source_error() {
        let result = resolve_secret(None, None, None);
        assert!(matches!(result, Err(SecretError::NoSourceProvided)));
        assert!(!SecretSource::default().is_configured());
    }

    #[test]
    fn test_file_not_found_error() {
        let result = resolve_secret(None, Some("/nonexistent/path/to/key"), None);
        assert!(matches!(result, Err(SecretError::FileReadError { .. })));
    }

    #[test]
    #[serial]
    fn test_env_var_not_set_error() {
        let result = resolve_secret(None, None, Some("LINKSHELF_DEFINITELY_UNSET_9876"));
        assert!(matches!(result, Err(SecretError::EnvVarNotSet { .. })));
    }

    #[test]
    fn test_empty_key_file_is_an_error() {
        let temp_file = NamedTempFile::new().unwrap();
        let result = resolve_secret(None, Some(temp_file.path().to_str().unwrap()), None);
        assert!(matches!(result, Err(SecretError::Empty { .. })));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/absolute/path"), "/absolute/path");
        assert_eq!(expand_home("relative/path"), "relative/path");

        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy().into_owned();
            assert_eq!(expand_home("~/key"), format!("{}/key", home));
            assert_eq!(expand_home("~"), home);
        }
    }
}
