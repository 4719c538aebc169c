//! Recommendation Resolver
//!
//! Looks up the authored natural-remedy steps for a diagnosed pest. A lookup
//! miss resolves to the generic fallback set, so guidance is never empty.

use crate::knowledge::{fallback_steps, KnowledgeBase, RemedyCategory, RemedyStep};
use crate::scorer::DiagnosisResult;
use serde::{Deserialize, Serialize};

/// Steps for `pest_name` under `crop_key`, verbatim and in authoring order
///
/// `crop_key` of `None` searches every crop section.
pub fn remedy_steps_for(
    pest_name: &str,
    crop_key: Option<&str>,
    kb: &KnowledgeBase,
) -> Vec<RemedyStep> {
    match kb.find_pest(pest_name, crop_key) {
        Some(pest) if !pest.remedy_steps.is_empty() => pest.remedy_steps.clone(),
        _ => {
            tracing::debug!(
                "No remedy steps for '{}' (crop {:?}), using generic set",
                pest_name,
                crop_key
            );
            fallback_steps()
        }
    }
}

/// Steps for a scorer result
pub fn steps_for_result(result: &DiagnosisResult, kb: &KnowledgeBase) -> Vec<RemedyStep> {
    if result.is_unknown() {
        return fallback_steps();
    }
    remedy_steps_for(&result.pest_name, result.crop_key.as_deref(), kb)
}

/// Step titles grouped by category, the shape returned to the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemedyGroups {
    pub bio: Vec<String>,
    pub cultural: Vec<String>,
    pub predator: Vec<String>,
}

impl RemedyGroups {
    pub fn from_steps(steps: &[RemedyStep]) -> Self {
        let mut groups = Self::default();
        for step in steps {
            groups.bucket_mut(step.category).push(step.title.clone());
        }
        groups
    }

    pub fn fallback() -> Self {
        Self::from_steps(&fallback_steps())
    }

    pub fn get(&self, category: RemedyCategory) -> &[String] {
        match category {
            RemedyCategory::Bio => &self.bio,
            RemedyCategory::Cultural => &self.cultural,
            RemedyCategory::Predator => &self.predator,
        }
    }

    /// First entry of a category, if any
    pub fn first(&self, category: RemedyCategory) -> Option<&str> {
        self.get(category).first().map(|s| s.as_str())
    }

    fn bucket_mut(&mut self, category: RemedyCategory) -> &mut Vec<String> {
        match category {
            RemedyCategory::Bio => &mut self.bio,
            RemedyCategory::Cultural => &mut self.cultural,
            RemedyCategory::Predator => &mut self.predator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KbVariant;

    #[test]
    fn test_steps_returned_in_authoring_order() {
        let kb = KnowledgeBase::builtin(KbVariant::CropScoped).unwrap();
        let steps = remedy_steps_for("Stem Borer", Some("Rice"), &kb);
        let titles: Vec<&str> = steps.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Trichogramma release", "Pheromone traps", "Bt spray (Bacillus thuringiensis)"]
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let kb = KnowledgeBase::builtin(KbVariant::CropScoped).unwrap();
        let steps = remedy_steps_for("whitefly", Some("cotton"), &kb);
        assert_eq!(steps[0].title, "Neem oil + yellow sticky traps");
    }

    #[test]
    fn test_miss_returns_generic_set() {
        let kb = KnowledgeBase::builtin(KbVariant::CropScoped).unwrap();
        // pest exists, but under a different crop
        let wrong_crop = remedy_steps_for("Stem Borer", Some("Wheat"), &kb);
        assert_eq!(wrong_crop, fallback_steps());

        let unknown = remedy_steps_for("Locust", None, &kb);
        assert_eq!(unknown.len(), 3);
        let groups = RemedyGroups::from_steps(&unknown);
        assert_eq!(groups.bio, vec!["Apply neem-based extract 3–5%".to_string()]);
        assert_eq!(groups.cultural, vec!["Improve drainage and remove infested parts".to_string()]);
        assert_eq!(groups.predator, vec!["Conserve beneficial insects".to_string()]);
    }

    #[test]
    fn test_groups_keep_order_within_category() {
        let kb = KnowledgeBase::builtin(KbVariant::CropList).unwrap();
        let steps = remedy_steps_for("Rice Yellow Stem Borer", None, &kb);
        let groups = RemedyGroups::from_steps(&steps);
        assert_eq!(groups.bio.len(), 3);
        assert_eq!(groups.first(RemedyCategory::Bio), Some("Install pheromone traps @ 4–5/acre"));
        assert_eq!(
            groups.first(RemedyCategory::Predator),
            Some("Conserve spiders, ladybird beetles by avoiding broad-spectrum sprays")
        );
    }
}
