//! Text generation providers
//!
//! A single seam, `TextGenerator::generate(prompt)`, in front of a hosted
//! model. Callers own the fallback; providers just report failure.

use async_trait::async_trait;
use reqwest::Client;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("No text generation provider configured")]
    NotConfigured,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}

/// Remote text generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Used when no API key is configured; every call fails
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::NotConfigured)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

// ============================================================================
// OpenAI-compatible chat completions
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-5-mini";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl OpenAiConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Single request per call: no retry, no client-side timeout
pub struct OpenAiTextGenerator {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiTextGenerator {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response.json().await?;
        extract_message_content(&json)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

/// `choices[0].message.content` of a chat completion
fn extract_message_content(json: &serde_json::Value) -> Result<String, ProviderError> {
    json.pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ProviderError::InvalidResponse("missing choices[0].message.content".to_string()))
}
