use async_trait::async_trait;

use crate::error::{NarezkaError, Result};
use crate::extractor::CompletionClient;
use crate::provider::Provider;

static SYSTEM_PROMPT: &str = "You are a viral short-form content expert. You identify segments from video transcripts that can go viral on platforms like TikTok, YouTube Shorts, Instagram Reels and LinkedIn. You MUST respond ONLY with valid JSON as specified, with no explanatory text before or after it.";

/// Chat-completions client for OpenAI-compatible providers. One in-flight
/// request at a time; retry policy lives with the caller.
pub struct ChatCompletionClient {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: String,
}

impl ChatCompletionClient {
    pub fn from_provider(provider: &Provider, model_override: Option<String>) -> Result<Self> {
        let config = provider.config();
        let api_key = provider.validate_api_key()?;

        let model = match model_override {
            Some(model) => model,
            None => match provider {
                Provider::OpenRouter => std::env::var("OPENROUTER_MODEL")
                    .unwrap_or_else(|_| config.model.to_string()),
                _ => config.model.to_string(),
            },
        };

        Ok(Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.to_string(),
            model,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "system",
                        "content": SYSTEM_PROMPT,
                    },
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "temperature": 0.3,
                "stream": false,
            }))
            .send()
            .await?
            .json::<serde_json::Value>()
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| NarezkaError::MalformedResponse {
                reason: format!("invalid API response: {:?}", response),
            })?;

        Ok(content.to_string())
    }
}
