use crate::error::{NarezkaError, Result};

#[derive(Clone, Debug, Default)]
pub enum Provider {
    #[default]
    OpenRouter,
    OpenAi,
    Grok,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::OpenRouter => ProviderConfig {
                api_url: "https://openrouter.ai/api/v1/chat/completions",
                model: "openai/gpt-4.1",
                env_var: "OPENROUTER_API_KEY",
            },
            Provider::OpenAi => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-5.1",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "OpenRouter",
            Provider::OpenAi => "OpenAI",
            Provider::Grok => "Grok",
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String> {
        let config = self.config();
        std::env::var(config.env_var).map_err(|_| NarezkaError::MissingApiKey {
            env_var: config.env_var.to_string(),
        })
    }
}
