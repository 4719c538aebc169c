//! Diagnosis Scorer - ranks pests for a field report
//!
//! One keyword-overlap heuristic shared by every caller, parameterised by the
//! knowledge base variant it is handed:
//! - crop-list catalogs filter pests by their own crop words
//! - crop-scoped catalogs take the pests registered under the resolved crop
//!
//! Per candidate: crop credit + capped keyword credit + context bonuses, then
//! a fixed linear scale into a clamped confidence. Pure and deterministic.

use crate::knowledge::{ContextSource, KbVariant, KnowledgeBase, PestRecord, UNKNOWN_PEST};
use crate::utils::normalization::{normalize_confidence, round_to};
use crate::utils::text::{count_keyword_hits, search_text, string_field};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Scoring constants
// ============================================================================

/// Empirically chosen weights, kept as named values rather than re-derived
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Added once when the pest applies to the query crop
    pub crop_match_credit: f64,
    /// Credit per keyword found in the search text
    pub keyword_hit_weight: f64,
    /// Upper bound on the summed keyword credit
    pub keyword_credit_cap: f64,
    /// Raw score that maps to confidence 1.0 before clamping
    pub normalization_ceiling: f64,
    pub confidence_floor: f64,
    pub confidence_cap: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            crop_match_credit: 1.0,
            keyword_hit_weight: 0.4,
            keyword_credit_cap: 1.5,
            normalization_ceiling: 3.0,
            confidence_floor: 0.1,
            confidence_cap: 0.99,
        }
    }
}

// ============================================================================
// Query / Result
// ============================================================================

/// A farmer's field report. All fields are free text and may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosisQuery {
    pub crop: String,
    pub stage: String,
    pub symptoms: String,
    pub weather: String,
    pub soil: String,
}

impl DiagnosisQuery {
    /// Build from a loosely typed JSON body; non-string fields become ""
    pub fn from_json_value(body: &serde_json::Value) -> Self {
        Self {
            crop: string_field(body, "crop"),
            stage: string_field(body, "stage"),
            symptoms: string_field(body, "symptoms"),
            weather: string_field(body, "weather"),
            soil: string_field(body, "soil"),
        }
    }
}

/// One ranked pest guess
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub pest_name: String,
    /// Normalised heuristic strength in [0.1, 0.99], two decimals
    pub confidence: f64,
    pub matched_reasons: Vec<String>,
    /// Crop section the pest was found under (None for the fallback)
    pub crop_key: Option<String>,
    pub raw_score: f64,
}

impl DiagnosisResult {
    /// Fallback when no pest record applies to the query crop
    pub fn unknown(config: &ScoringConfig) -> Self {
        Self {
            pest_name: UNKNOWN_PEST.to_string(),
            confidence: config.confidence_floor,
            matched_reasons: Vec::new(),
            crop_key: None,
            raw_score: 0.0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.crop_key.is_none() && self.pest_name == UNKNOWN_PEST
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Rank pests with the default constants
pub fn score(query: &DiagnosisQuery, kb: &KnowledgeBase) -> Vec<DiagnosisResult> {
    score_with_config(query, kb, &ScoringConfig::default())
}

/// Rank pests, best first. Ties keep catalog order.
///
/// Never empty: with no candidate pest the single result is the "Unknown"
/// fallback at the confidence floor.
pub fn score_with_config(
    query: &DiagnosisQuery,
    kb: &KnowledgeBase,
    config: &ScoringConfig,
) -> Vec<DiagnosisResult> {
    let crop = query.crop.trim().to_lowercase();
    let signals = Signals {
        search: search_text(&[&query.symptoms, &query.weather, &query.soil]),
        weather: query.weather.to_lowercase(),
        stage: query.stage.to_lowercase(),
    };

    let candidates: Vec<(&str, &PestRecord)> = match kb.variant {
        KbVariant::CropList => kb.pests().filter(|(_, pest)| pest.applies_to(&crop)).collect(),
        KbVariant::CropScoped => kb
            .resolve_crop(&query.crop)
            .map(|section| {
                section
                    .pests
                    .iter()
                    .map(|pest| (section.key.as_str(), pest))
                    .collect()
            })
            .unwrap_or_default(),
    };

    if candidates.is_empty() {
        tracing::debug!("No pest record for crop '{}', using fallback", query.crop);
        return vec![DiagnosisResult::unknown(config)];
    }

    let mut ranked: Vec<DiagnosisResult> = candidates
        .into_iter()
        .map(|(crop_key, pest)| score_pest(crop_key, pest, &signals, config))
        .collect();

    // Stable: equal scores keep catalog insertion order. Sums of the same
    // weights in a different order differ in the last bits, so compare a
    // quantised score.
    ranked.sort_by(|a, b| rank_key(b.raw_score).total_cmp(&rank_key(a.raw_score)));
    ranked
}

/// Decimal places kept when ordering raw scores
const RANK_PRECISION: i32 = 6;

fn rank_key(raw: f64) -> f64 {
    round_to(raw, RANK_PRECISION)
}

/// Lower-cased text views of a query
struct Signals {
    search: String,
    weather: String,
    stage: String,
}

fn score_pest(
    crop_key: &str,
    pest: &PestRecord,
    signals: &Signals,
    config: &ScoringConfig,
) -> DiagnosisResult {
    let mut raw = 0.0;
    let mut reasons = Vec::new();

    // Candidates are crop-filtered, so every one earns the crop credit
    raw += config.crop_match_credit;
    reasons.push(format!("Crop context suggests {}", pest.name));

    let hits = count_keyword_hits(&signals.search, &pest.keywords);
    if hits > 0 {
        raw += (hits as f64 * config.keyword_hit_weight).min(config.keyword_credit_cap);
        reasons.push(format!("{} symptom keyword(s) matched", hits));
    }

    for cw in &pest.context_weights {
        let text = match cw.tag.source() {
            ContextSource::Weather => &signals.weather,
            ContextSource::Stage => &signals.stage,
        };
        if cw.tag.matches(text) {
            raw += cw.weight;
            reasons.push(format!("Context bonus: {} (+{:.2})", cw.tag.label(), cw.weight));
        }
    }

    let confidence = normalize_confidence(
        raw,
        config.normalization_ceiling,
        config.confidence_floor,
        config.confidence_cap,
    );

    DiagnosisResult {
        pest_name: pest.name.clone(),
        confidence: round_to(confidence, 2),
        matched_reasons: reasons,
        crop_key: Some(crop_key.to_string()),
        raw_score: raw,
    }
}

// ============================================================================
// Scorer handle
// ============================================================================

/// Knowledge base + constants, shared across request handlers
#[derive(Debug, Clone)]
pub struct DiagnosisScorer {
    kb: Arc<KnowledgeBase>,
    config: ScoringConfig,
}

impl DiagnosisScorer {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self::with_config(kb, ScoringConfig::default())
    }

    pub fn with_config(kb: Arc<KnowledgeBase>, config: ScoringConfig) -> Self {
        Self { kb, config }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Full ranking for a query
    pub fn rank(&self, query: &DiagnosisQuery) -> Vec<DiagnosisResult> {
        score_with_config(query, &self.kb, &self.config)
    }

    /// Best guess (the fallback when nothing applies)
    pub fn top_match(&self, query: &DiagnosisQuery) -> DiagnosisResult {
        self.rank(query)
            .into_iter()
            .next()
            .unwrap_or_else(|| DiagnosisResult::unknown(&self.config))
    }
}
