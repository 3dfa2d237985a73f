pub mod agents;
pub mod compare;
pub mod domain;
pub mod fetch;
pub mod indicators;
pub mod llm;
pub mod market;
pub mod report;

pub mod config {
    use crate::llm::error::MissingCredentialError;
    use crate::llm::Provider;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub llm_provider: Provider,
        pub google_api_key: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub market_data_base_url: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let llm_provider = match non_empty_var("LLM_PROVIDER") {
                Some(s) => s.parse::<Provider>()?,
                None => Provider::Gemini,
            };

            Ok(Self {
                llm_provider,
                google_api_key: non_empty_var("GOOGLE_API_KEY"),
                anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                market_data_base_url: non_empty_var("MARKET_DATA_BASE_URL"),
            })
        }

        pub fn require_google_api_key(&self) -> Result<&str, MissingCredentialError> {
            self.google_api_key
                .as_deref()
                .ok_or(MissingCredentialError {
                    env_var: Provider::Gemini.credential_env_var(),
                })
        }

        pub fn require_anthropic_api_key(&self) -> Result<&str, MissingCredentialError> {
            self.anthropic_api_key
                .as_deref()
                .ok_or(MissingCredentialError {
                    env_var: Provider::Anthropic.credential_env_var(),
                })
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

}
