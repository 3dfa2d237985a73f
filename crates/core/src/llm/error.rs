use crate::llm::Provider;
use std::fmt;

/// How much of a provider's error body is carried into the error message.
const BODY_EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl LlmDiagnosticsError {
    /// Non-success HTTP response. The full body stays in `raw_output`; the message carries an
    /// excerpt so the provider's reason reaches logs and API errors.
    pub fn http(provider: Provider, status: reqwest::StatusCode, body: String) -> Self {
        Self {
            provider,
            stage: "http",
            detail: format!("status={status}: {}", excerpt(&body)),
            raw_output: Some(body),
        }
    }
}

fn excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLM error (provider={}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}

/// The configured model provider has no credential in the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCredentialError {
    pub env_var: &'static str,
}

impl fmt::Display for MissingCredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not configured", self.env_var)
    }
}

impl std::error::Error for MissingCredentialError {}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn http_error_carries_provider_reason() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        let err: anyhow::Error =
            LlmDiagnosticsError::http(Provider::Gemini, StatusCode::BAD_REQUEST, body.to_string()).into();
        let err = err.context("fundamental agent call failed");

        let msg = format!("{err:#}");
        assert!(msg.contains("stage=http"));
        assert!(msg.contains("status=400 Bad Request"));
        assert!(msg.contains("API key not valid"));

        let diag = err.downcast_ref::<LlmDiagnosticsError>().unwrap();
        assert_eq!(diag.raw_output.as_deref(), Some(body));
    }

    #[test]
    fn long_bodies_are_excerpted() {
        let body = "x".repeat(BODY_EXCERPT_CHARS * 3);
        let diag = LlmDiagnosticsError::http(Provider::Anthropic, StatusCode::TOO_MANY_REQUESTS, body.clone());
        assert!(diag.detail.ends_with("..."));
        assert!(diag.detail.len() < body.len());
        assert_eq!(diag.raw_output.map(|r| r.len()), Some(body.len()));
    }
}
