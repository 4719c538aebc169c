//! Knowledge base loading
//!
//! Two catalogs ship with the crate as JSON and are embedded at compile time:
//! - `kb_crop_list.json`: small field table, pests carry their own crop lists
//! - `kb_crop_scoped.json`: per-crop catalog with authored natural steps
//!
//! Either can be replaced at startup with a file on disk (`KB_PATH`).

use crate::knowledge::types::{KbVariant, KnowledgeBase, RemedyCategory, RemedyStep};
use std::fs;
use std::path::Path;

const CROP_LIST_JSON: &str = include_str!("../../data/kb_crop_list.json");
const CROP_SCOPED_JSON: &str = include_str!("../../data/kb_crop_scoped.json");

/// Name reported when no pest record matches the query crop
pub const UNKNOWN_PEST: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge base file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse knowledge base JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid knowledge base: {0}")]
    Invalid(String),
}

impl KnowledgeBase {
    /// Parse and validate a catalog from JSON text
    pub fn from_json(json: &str) -> Result<Self, KnowledgeError> {
        let kb: KnowledgeBase = serde_json::from_str(json)?;
        kb.validate()?;
        Ok(kb)
    }

    /// Load a catalog from disk
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let contents = fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let kb = Self::from_json(&contents)?;
        tracing::info!(
            "Loaded knowledge base from {:?} ({} crops, {} pests)",
            path,
            kb.sections.len(),
            kb.pest_count()
        );
        Ok(kb)
    }

    /// One of the embedded catalogs
    pub fn builtin(variant: KbVariant) -> Result<Self, KnowledgeError> {
        let json = match variant {
            KbVariant::CropList => CROP_LIST_JSON,
            KbVariant::CropScoped => CROP_SCOPED_JSON,
        };
        let kb = Self::from_json(json)?;
        if kb.variant != variant {
            return Err(KnowledgeError::Invalid(format!(
                "embedded catalog declares {:?}, expected {:?}",
                kb.variant, variant
            )));
        }
        Ok(kb)
    }

    fn validate(&self) -> Result<(), KnowledgeError> {
        if self.sections.is_empty() {
            return Err(KnowledgeError::Invalid("no crop sections".to_string()));
        }
        for (crop_key, pest) in self.pests() {
            if pest.name.trim().is_empty() {
                return Err(KnowledgeError::Invalid(format!(
                    "pest with empty name under crop '{}'",
                    crop_key
                )));
            }
            if pest.remedy_steps.is_empty() {
                return Err(KnowledgeError::Invalid(format!(
                    "pest '{}' has no remedy steps",
                    pest.name
                )));
            }
            if let Some(cw) = pest.context_weights.iter().find(|cw| !cw.weight.is_finite()) {
                return Err(KnowledgeError::Invalid(format!(
                    "pest '{}' has non-finite weight for '{}'",
                    pest.name,
                    cw.tag.label()
                )));
            }
        }
        Ok(())
    }
}

/// Generic steps used when a pest or crop is not in the catalog
pub fn fallback_steps() -> Vec<RemedyStep> {
    vec![
        RemedyStep::new(
            "Apply neem-based extract 3–5%",
            "Spray on both leaf surfaces in the early morning or evening.",
            "Repeat every 7–10 days while symptoms persist",
            RemedyCategory::Bio,
        ),
        RemedyStep::new(
            "Improve drainage and remove infested parts",
            "Clear waterlogged patches and destroy damaged plant material away from the field.",
            "At the next field visit",
            RemedyCategory::Cultural,
        ),
        RemedyStep::new(
            "Conserve beneficial insects",
            "Avoid broad-spectrum sprays so spiders, ladybirds and parasitoids can build up.",
            "Season-long",
            RemedyCategory::Predator,
        ),
    ]
}
