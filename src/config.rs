// Server configuration
//
// Purpose: read environment variables once at startup and build the
// collaborators (knowledge base, text generator, log store) from them.

use crate::effectiveness::{JsonFileLogStore, LogStore, LOG_STORE_KEY};
use crate::knowledge::{KbVariant, KnowledgeBase};
use crate::translation::{DisabledGenerator, OpenAiConfig, OpenAiTextGenerator, TextGenerator};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Which embedded catalog to use when `kb_path` is unset
    pub kb_variant: KbVariant,
    /// Catalog file overriding the embedded one
    pub kb_path: Option<PathBuf>,
    pub log_store_path: PathBuf,
    /// None disables translation and AI notes (original text is returned)
    pub openai: Option<OpenAiConfig>,
    /// Ask the provider to phrase diagnosis notes
    pub ai_notes: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            kb_variant: KbVariant::CropScoped,
            kb_path: None,
            log_store_path: PathBuf::from(format!("data/{}.json", LOG_STORE_KEY)),
            openai: None,
            ai_notes: false,
        }
    }
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup (environment, test map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(p) => p.parse().with_context(|| format!("Invalid PORT '{}'", p))?,
            None => defaults.port,
        };

        let kb_variant = match get("KB_VARIANT") {
            Some(v) => v.parse::<KbVariant>().map_err(anyhow::Error::msg)?,
            None => defaults.kb_variant,
        };

        let openai = get("OPENAI_API_KEY").map(|key| {
            let mut config = OpenAiConfig::new(&key);
            if let Some(model) = get("OPENAI_MODEL") {
                config.model = model;
            }
            if let Some(url) = get("OPENAI_BASE_URL") {
                config.base_url = url;
            }
            config
        });

        let ai_notes = get("AI_NOTES")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(defaults.ai_notes);

        Ok(Self {
            port,
            kb_variant,
            kb_path: get("KB_PATH").map(PathBuf::from),
            log_store_path: get("LOG_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_store_path),
            openai,
            ai_notes,
        })
    }

    pub fn load_knowledge_base(&self) -> Result<KnowledgeBase> {
        match &self.kb_path {
            Some(path) => KnowledgeBase::load(path)
                .with_context(|| format!("Failed to load knowledge base from {:?}", path)),
            None => KnowledgeBase::builtin(self.kb_variant)
                .with_context(|| format!("Embedded {:?} catalog is invalid", self.kb_variant)),
        }
    }

    pub fn text_generator(&self) -> Arc<dyn TextGenerator> {
        match &self.openai {
            Some(config) => Arc::new(OpenAiTextGenerator::new(config.clone())),
            None => Arc::new(DisabledGenerator),
        }
    }

    pub fn log_store(&self) -> Arc<dyn LogStore> {
        Arc::new(JsonFileLogStore::new(self.log_store_path.clone()))
    }

    /// Log the effective configuration (API key never printed)
    pub fn log_summary(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  PORT: {}", self.port);
        match &self.kb_path {
            Some(path) => tracing::info!("  KB_PATH: {:?}", path),
            None => tracing::info!("  KB_VARIANT: {:?} (embedded)", self.kb_variant),
        }
        tracing::info!("  LOG_STORE_PATH: {:?}", self.log_store_path);
        match &self.openai {
            Some(c) => tracing::info!("  Text provider: {} at {}", c.model, c.base_url),
            None => tracing::info!("  Text provider: disabled (OPENAI_API_KEY not set)"),
        }
        tracing::info!("  AI_NOTES: {}", self.ai_notes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.kb_variant, KbVariant::CropScoped);
        assert!(config.openai.is_none());
        assert!(!config.ai_notes);
        assert_eq!(config.log_store_path, PathBuf::from("data/krishi_logs.json"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("KB_VARIANT", "crop_list"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("AI_NOTES", "true"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.kb_variant, KbVariant::CropList);
        let openai = config.openai.unwrap();
        assert_eq!(openai.model, "gpt-4o-mini");
        assert_eq!(openai.base_url, crate::translation::provider::DEFAULT_BASE_URL);
        assert!(config.ai_notes);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
        assert!(config_from(&[("KB_VARIANT", "graph")]).is_err());
    }

    #[test]
    fn test_blank_api_key_disables_provider() {
        let config = config_from(&[("OPENAI_API_KEY", "  ")]).unwrap();
        assert!(config.openai.is_none());
        assert_eq!(config.text_generator().name(), "disabled");
    }

    #[test]
    fn test_embedded_catalog_loads() {
        let kb = config_from(&[("KB_VARIANT", "flat")]).unwrap().load_knowledge_base().unwrap();
        assert_eq!(kb.variant, KbVariant::CropList);
    }
}
