//! Guidance Composer
//!
//! Turns a diagnosis into plain instruction text. The same string is shown
//! on screen, read aloud by the client's speech engine and sent for
//! translation, so the layout is fixed and contains no localization.

use crate::knowledge::{RemedyCategory, RemedyStep};
use crate::recommendation::RemedyGroups;
use crate::scorer::{DiagnosisQuery, DiagnosisResult};

/// Plain-text formatter for diagnosis guidance
pub struct GuidanceComposer;

impl GuidanceComposer {
    /// Compose guidance text
    ///
    /// ```text
    /// Crop: Rice. Stage: Vegetative.
    /// Recommended natural treatment steps:
    /// 1. Pheromone traps: Install 12 traps/ha ... (Vegetative to booting stage)
    /// Notes: ...
    /// ```
    ///
    /// The notes line is omitted when `notes` is empty.
    pub fn compose(query: &DiagnosisQuery, steps: &[RemedyStep], notes: Option<&str>) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(steps.len() + 3);

        lines.push(format!("Crop: {}. Stage: {}.", query.crop, query.stage));
        lines.push("Recommended natural treatment steps:".to_string());
        for (idx, step) in steps.iter().enumerate() {
            lines.push(format!("{}. {}: {} ({})", idx + 1, step.title, step.detail, step.timing));
        }

        if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
            lines.push(format!("Notes: {}", notes));
        }

        lines.join("\n")
    }

    /// Deterministic notes for the top match: pest, first bio and cultural steps
    pub fn compose_notes(result: &DiagnosisResult, groups: &RemedyGroups) -> String {
        let mut lines = vec![format!(
            "Likely pest: {} (confidence {})",
            result.pest_name, result.confidence
        )];
        if let Some(bio) = groups.first(RemedyCategory::Bio) {
            lines.push(format!("Bio-control: {}", bio));
        }
        if let Some(cultural) = groups.first(RemedyCategory::Cultural) {
            lines.push(format!("Cultural: {}", cultural));
        }
        lines.join("\n")
    }

    /// Prompt asking a text-generation provider to phrase the notes
    pub fn notes_prompt(query: &DiagnosisQuery, result: &DiagnosisResult, groups: &RemedyGroups) -> String {
        format!(
            "You are advising a smallholder farmer. In at most three short sentences, explain the likely pest \
             and the first natural steps to take. Do not recommend chemical pesticides.\n\n\
             Crop: {}\nStage: {}\nSymptoms: {}\nWeather: {}\nSoil: {}\n\n{}",
            query.crop,
            query.stage,
            query.symptoms,
            query.weather,
            query.soil,
            Self::compose_notes(result, groups)
        )
    }
}
