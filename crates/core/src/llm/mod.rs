pub mod anthropic;
pub mod error;
pub mod gemini;

use crate::config::Settings;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// One text completion: a system prompt for the role and the user prompt.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Anthropic,
}

impl Provider {
    pub fn credential_env_var(self) -> &'static str {
        match self {
            Provider::Gemini => "GOOGLE_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gemini => f.write_str("gemini"),
            Provider::Anthropic => f.write_str("anthropic"),
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            other => anyhow::bail!("unsupported LLM_PROVIDER: {other}"),
        }
    }
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<String>;
}

/// Builds a model client on demand, so the credential is checked on every use rather than
/// once at startup.
pub trait LlmConnector: Send + Sync {
    fn connect(&self) -> anyhow::Result<Arc<dyn LlmClient>>;
}

/// Reads settings from the process environment on each `connect`.
#[derive(Debug, Clone, Default)]
pub struct EnvLlmConnector;

impl LlmConnector for EnvLlmConnector {
    fn connect(&self) -> anyhow::Result<Arc<dyn LlmClient>> {
        let settings = Settings::from_env()?;
        connect_from_settings(&settings)
    }
}

pub fn connect_from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn LlmClient>> {
    Ok(match settings.llm_provider {
        Provider::Gemini => Arc::new(gemini::GeminiClient::from_settings(settings)?),
        Provider::Anthropic => Arc::new(anthropic::AnthropicClient::from_settings(settings)?),
    })
}
