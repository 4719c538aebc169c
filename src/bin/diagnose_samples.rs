//! Run canned field reports through both knowledge base variants
//!
//! Prints the ranking and the composed guidance for each report.
//! Usage: cargo run --bin diagnose_samples

use pest_advisor_rust::recommendation::steps_for_result;
use pest_advisor_rust::{DiagnosisQuery, DiagnosisScorer, GuidanceComposer, KbVariant, KnowledgeBase};
use std::sync::Arc;
use std::time::Instant;

fn sample(crop: &str, stage: &str, symptoms: &str, weather: &str, soil: &str) -> DiagnosisQuery {
    DiagnosisQuery {
        crop: crop.to_string(),
        stage: stage.to_string(),
        symptoms: symptoms.to_string(),
        weather: weather.to_string(),
        soil: soil.to_string(),
    }
}

fn main() -> anyhow::Result<()> {
    let samples = vec![
        (
            "Rice, dead hearts",
            sample("Rice", "Vegetative", "white head dead heart borer holes", "humid", "clay loam"),
        ),
        (
            "Paddy, hopper burn",
            sample("paddy", "reproductive", "hopper burn at base, yellowing", "hot and humid", ""),
        ),
        (
            "Maize whorl damage",
            sample("corn", "vegetative", "whorl damage with frass, ragged leaves", "warm", "sandy"),
        ),
        (
            "Cotton, sticky leaves",
            sample("Cotton", "Reproductive", "sticky honeydew, curling leaves", "humid", ""),
        ),
        (
            "Unlisted crop",
            sample("banana", "", "leaf spots", "", ""),
        ),
    ];

    for variant in [KbVariant::CropList, KbVariant::CropScoped] {
        let kb = Arc::new(KnowledgeBase::builtin(variant)?);
        let scorer = DiagnosisScorer::new(Arc::clone(&kb));

        println!("\n{}", "=".repeat(72));
        println!("Knowledge base: {:?} ({} pests, crops {:?})", variant, kb.pest_count(), kb.crop_keys());
        println!("{}", "=".repeat(72));

        for (label, query) in &samples {
            let start = Instant::now();
            let ranked = scorer.rank(query);
            let elapsed = start.elapsed();

            println!("\n{} [{:?}]", label, elapsed);
            for (idx, result) in ranked.iter().enumerate() {
                println!(
                    "  {}. {:<24} confidence {:.2} (raw {:.2})",
                    idx + 1,
                    result.pest_name,
                    result.confidence,
                    result.raw_score
                );
                for reason in &result.matched_reasons {
                    println!("       - {}", reason);
                }
            }

            if let Some(top) = ranked.first() {
                let steps = steps_for_result(top, &kb);
                println!("\n{}", GuidanceComposer::compose(query, &steps, None));
            }
        }
    }

    Ok(())
}
