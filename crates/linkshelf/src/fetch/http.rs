//! Blocking HTTP fetcher backed by reqwest.

use std::io::Read;
use std::sync::LazyLock;
use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::Url;

use super::ContentFetcher;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::sanitize::redact_url;

/// Maximum number of redirects followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// Bytes scanned for a `<meta charset>` declaration.
const META_SNIFF_BYTES: usize = 1024;

static RE_META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_.:-]+)"#).unwrap()
});

pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    fn map_send_error(url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                message: e.to_string(),
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

impl ContentFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let redacted = redact_url(url);
        let parsed =
            Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", redacted, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                redacted,
                parsed.scheme()
            )));
        }

        log::debug!("Fetching {}", redacted);

        let response = self
            .client
            .get(parsed)
            .send()
            .map_err(|e| Self::map_send_error(&redacted, e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: redacted,
                status: status.as_u16(),
            });
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes as u64)
        {
            return Err(FetchError::BodyTooLarge {
                url: redacted,
                limit: self.max_body_bytes,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let mut body = Vec::new();
        response
            .take(self.max_body_bytes as u64 + 1)
            .read_to_end(&mut body)
            .map_err(|e| {
                let timed_out = e.kind() == std::io::ErrorKind::TimedOut
                    || e.to_string().contains("timed out");
                if timed_out {
                    FetchError::Timeout {
                        url: redacted.clone(),
                        message: e.to_string(),
                    }
                } else {
                    FetchError::Body {
                        url: redacted.clone(),
                        message: e.to_string(),
                    }
                }
            })?;

        if body.len() > self.max_body_bytes {
            return Err(FetchError::BodyTooLarge {
                url: redacted,
                limit: self.max_body_bytes,
            });
        }

        log::debug!("Fetched {} bytes from {}", body.len(), redacted);

        Ok(decode_body(&body, content_type.as_deref()))
    }
}

/// Decodes `body` using the `Content-Type` charset, then a `<meta charset>`
/// near the top of the document, then UTF-8. A byte order mark wins over all.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(header_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| meta_charset(body))
        .unwrap_or(UTF_8);

    let (text, used, had_errors) = encoding.decode(body);
    if had_errors {
        log::debug!("Body contained bytes invalid in {}", used.name());
    }
    text.into_owned()
}

fn header_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

fn meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(META_SNIFF_BYTES)];
    let label = RE_META_CHARSET.captures(head)?.get(1)?;
    Encoding::for_label(label.as_bytes())
}
