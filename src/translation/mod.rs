//! Guidance translation and notes phrasing
//!
//! Both go through a `TextGenerator` and both mask provider failure: the
//! caller always gets usable text back, never an error.

pub mod provider;

pub use provider::{
    DisabledGenerator, OpenAiConfig, OpenAiTextGenerator, ProviderError, TextGenerator,
};

use serde::{Deserialize, Serialize};

pub const DEFAULT_TARGET_LANG: &str = "hi-IN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub text: String,
    pub target_lang: String,
}

impl TranslationRequest {
    /// Loose parse: non-string text becomes "", blank language becomes hi-IN
    pub fn from_json_value(body: &serde_json::Value) -> Self {
        let text = body
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let target_lang = body
            .get("targetLang")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_TARGET_LANG)
            .to_string();
        Self { text, target_lang }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub text: String,
}

pub fn translation_prompt(text: &str, target_lang: &str) -> String {
    format!(
        "Translate the following agricultural instructions into {}. Keep steps clear and short:\n\n{}",
        target_lang, text
    )
}

/// Translate guidance text
///
/// Blank input returns "" without calling the provider. Provider failure
/// (or an empty completion) returns the original text unchanged.
pub async fn translate(generator: &dyn TextGenerator, request: &TranslationRequest) -> TranslationResponse {
    if request.text.trim().is_empty() {
        return TranslationResponse { text: String::new() };
    }

    let prompt = translation_prompt(&request.text, &request.target_lang);
    let text = generate_or(generator, &prompt, &request.text).await;
    TranslationResponse { text }
}

/// Provider output, or `fallback` on failure or empty output
pub async fn generate_or(generator: &dyn TextGenerator, prompt: &str, fallback: &str) -> String {
    match generator.generate(prompt).await {
        Ok(out) if !out.trim().is_empty() => out,
        Ok(_) => {
            tracing::warn!("Provider '{}' returned empty text, using original", generator.name());
            fallback.to_string()
        }
        Err(ProviderError::NotConfigured) => {
            tracing::debug!("No text provider configured, using original text");
            fallback.to_string()
        }
        Err(e) => {
            tracing::warn!("Provider '{}' failed, using original text: {}", generator.name(), e);
            fallback.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records prompts and answers with a fixed reply
    struct ScriptedGenerator {
        reply: Result<String, ()>,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    impl ScriptedGenerator {
        fn ok(reply: &str) -> Self {
            Self { reply: Ok(reply.to_string()), calls: AtomicUsize::new(0), last_prompt: Mutex::new(None) }
        }

        fn failing() -> Self {
            Self { reply: Err(()), calls: AtomicUsize::new(0), last_prompt: Mutex::new(None) }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            self.reply
                .clone()
                .map_err(|_| ProviderError::Status { status: 503, body: "unavailable".into() })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn request(text: &str, lang: &str) -> TranslationRequest {
        TranslationRequest { text: text.into(), target_lang: lang.into() }
    }

    #[tokio::test]
    async fn test_empty_text_skips_provider() {
        let generator = ScriptedGenerator::ok("should not be used");
        let out = translate(&generator, &request("", "hi-IN")).await;
        assert_eq!(out.text, "");
        let out = translate(&generator, &request("   \n", "hi-IN")).await;
        assert_eq!(out.text, "");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_translation_uses_prompt_and_reply() {
        let generator = ScriptedGenerator::ok("फसल: धान");
        let out = translate(&generator, &request("Crop: Rice.", "hi-IN")).await;
        assert_eq!(out.text, "फसल: धान");
        let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.starts_with("Translate the following agricultural instructions into hi-IN."));
        assert!(prompt.ends_with("\n\nCrop: Rice."));
    }

    #[tokio::test]
    async fn test_provider_failure_returns_original() {
        let generator = ScriptedGenerator::failing();
        let out = translate(&generator, &request("Crop: Rice.", "ta-IN")).await;
        assert_eq!(out.text, "Crop: Rice.");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

        let out = translate(&DisabledGenerator, &request("Crop: Rice.", "ta-IN")).await;
        assert_eq!(out.text, "Crop: Rice.");
    }

    #[tokio::test]
    async fn test_blank_completion_returns_original() {
        let generator = ScriptedGenerator::ok("  ");
        let out = translate(&generator, &request("Crop: Wheat.", "pa-IN")).await;
        assert_eq!(out.text, "Crop: Wheat.");
    }

    #[test]
    fn test_request_from_loose_json() {
        let req = TranslationRequest::from_json_value(&serde_json::json!({"text": 5, "targetLang": "  "}));
        assert_eq!(req, request("", DEFAULT_TARGET_LANG));

        let req = TranslationRequest::from_json_value(&serde_json::json!({"text": "hi", "targetLang": "mr-IN"}));
        assert_eq!(req, request("hi", "mr-IN"));
    }
}
