//! HTTP collaborator for the code-generation service.
//!
//! The service is opaque: two JSON endpoints, `POST /improve-code` and
//! `POST /run-code`. [`CodeService::improve_code`] hands back the raw status, the
//! `Retry-After` hint and the body text, leaving interpretation to the submission
//! controller so that a malformed body follows the same retry rules as any other
//! failed attempt.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Longest error body echoed back to the user.
pub const MAX_ERROR_CONTENT_LEN: usize = 200;

/// Connection settings for [`HttpCodeService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base URL without a trailing path, e.g. `http://127.0.0.1:5000`.
    pub base_url: String,
    /// Per-request transport timeout.
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_owned(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Body of `POST /improve-code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestPayload {
    /// Base code; empty means "generate from scratch".
    pub code: String,
    pub selected_code: String,
    pub prompt: String,
}

/// Success body of `POST /improve-code`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImproveResponse {
    #[serde(default)]
    pub modified_code: String,
    #[serde(default)]
    pub explanation: String,
}

/// Error body shared by both endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Success body of `POST /run-code`.
#[derive(Debug, Clone, Deserialize)]
struct RunOutput {
    #[serde(default)]
    output: Option<String>,
}

/// A raw reply from `POST /improve-code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReply {
    pub status: u16,
    pub retry_after: Option<Duration>,
    pub body: String,
}

impl ServiceReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `{error}` message if the body carries one, else the truncated raw body.
    pub fn error_message(&self) -> String {
        match serde_json::from_str::<ErrorBody>(&self.body) {
            Ok(body) => truncate_str(&body.error, MAX_ERROR_CONTENT_LEN).to_owned(),
            Err(_) => truncate_str(self.body.trim(), MAX_ERROR_CONTENT_LEN).to_owned(),
        }
    }
}

/// Outcome of `POST /run-code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReply {
    Output(String),
    Failed(String),
}

/// Default message when the run endpoint succeeds without printing anything.
pub const RUN_OK_MESSAGE: &str = "Code executed successfully.";

#[async_trait]
pub trait CodeService: Send + Sync {
    async fn improve_code(&self, payload: &RequestPayload) -> Result<ServiceReply, TransportError>;

    async fn run_code(&self, code: &str) -> Result<RunReply, TransportError>;
}

/// [`CodeService`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpCodeService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCodeService {
    pub fn new(config: &ServiceConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl CodeService for HttpCodeService {
    async fn improve_code(&self, payload: &RequestPayload) -> Result<ServiceReply, TransportError> {
        let response = self
            .client
            .post(self.endpoint("improve-code"))
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = response.text().await?;

        tracing::debug!(status, body_len = body.len(), "improve-code replied");
        Ok(ServiceReply { status, retry_after, body })
    }

    async fn run_code(&self, code: &str) -> Result<RunReply, TransportError> {
        if code.trim().is_empty() {
            return Ok(RunReply::Failed("No code provided".to_owned()));
        }

        let response = self
            .client
            .post(self.endpoint("run-code"))
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), "run-code replied");

        if status.is_success() {
            let output = serde_json::from_str::<RunOutput>(&body)
                .ok()
                .and_then(|r| r.output)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| RUN_OK_MESSAGE.to_owned());
            return Ok(RunReply::Output(output));
        }

        let reply = ServiceReply { status: status.as_u16(), retry_after: None, body };
        Ok(RunReply::Failed(reply.error_message()))
    }
}

/// Parses a `Retry-After` header given in whole seconds.
///
/// HTTP-date values are not supported and yield `None`, which falls back to the
/// computed backoff.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Truncates on a char boundary at or below `max` bytes.
pub fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_wire_names() {
        let payload = RequestPayload {
            code: String::new(),
            selected_code: "x".into(),
            prompt: "make a game".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"code": "", "selected_code": "x", "prompt": "make a game"})
        );
    }

    #[test]
    fn retry_after_accepts_seconds_only() {
        assert_eq!(parse_retry_after(" 3 "), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn error_message_prefers_error_field() {
        let reply = ServiceReply {
            status: 500,
            retry_after: None,
            body: r#"{"error": "Prompt is required"}"#.into(),
        };
        assert_eq!(reply.error_message(), "Prompt is required");

        let raw = ServiceReply { status: 502, retry_after: None, body: "Bad Gateway".into() };
        assert_eq!(raw.error_message(), "Bad Gateway");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_str("ééé", 3), "é");
        assert_eq!(truncate_str("abc", 10), "abc");
    }

    #[test]
    fn missing_explanation_defaults_to_empty() {
        let r: ImproveResponse = serde_json::from_str(r#"{"modified_code": "x = 1"}"#).unwrap();
        assert_eq!(r.explanation, "");
    }
}
