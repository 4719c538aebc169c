//! Effectiveness Aggregator
//!
//! Natural vs chemical comparison: partition logs by method type and average
//! six outcome metrics per partition.
//!
//! Empty partitions divide by 1 and report zeros, never NaN.

use crate::effectiveness::types::{EffectivenessLogEntry, MethodType};
use crate::utils::normalization::mean_or_zero;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cost units charged per labour hour when folding labour into cost
pub const LABOR_HOUR_COST: f64 = 1.0;

/// Averages for one method type
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    pub entries: usize,
    /// yield after - yield before
    pub mean_yield_delta: f64,
    /// pest count before - pest count after
    pub mean_pest_reduction: f64,
    pub mean_soil_health: f64,
    /// cost input + labour hours (lower is better)
    pub mean_cost: f64,
    pub mean_pollinator_impact: f64,
    /// Share of entries with a recurrence inside 60 days, 0-100
    pub recurrence_rate_pct: f64,
}

impl MetricSummary {
    fn from_entries(entries: &[&EffectivenessLogEntry]) -> Self {
        Self {
            entries: entries.len(),
            mean_yield_delta: mean_of(entries, |e| e.yield_after - e.yield_before),
            mean_pest_reduction: mean_of(entries, |e| e.pest_count_before - e.pest_count_after),
            mean_soil_health: mean_of(entries, |e| e.soil_health_score),
            mean_cost: mean_of(entries, |e| e.cost_input + e.labor_hours * LABOR_HOUR_COST),
            mean_pollinator_impact: mean_of(entries, |e| e.pollinator_count),
            recurrence_rate_pct: mean_of(entries, |e| {
                if e.recurrence_within_60_days { 1.0 } else { 0.0 }
            }) * 100.0,
        }
    }
}

fn mean_of<F>(entries: &[&EffectivenessLogEntry], metric: F) -> f64
where
    F: Fn(&EffectivenessLogEntry) -> f64,
{
    let sum: f64 = entries.iter().map(|e| metric(*e)).sum();
    mean_or_zero(sum, entries.len())
}

/// Per-method summaries; both method types are always present
pub fn aggregate(logs: &[EffectivenessLogEntry]) -> BTreeMap<MethodType, MetricSummary> {
    let mut partitions: FxHashMap<MethodType, Vec<&EffectivenessLogEntry>> = FxHashMap::default();
    for entry in logs {
        partitions.entry(entry.method_type).or_default().push(entry);
    }

    MethodType::ALL
        .iter()
        .map(|method| {
            let entries = partitions.get(method).map(|v| v.as_slice()).unwrap_or(&[]);
            (*method, MetricSummary::from_entries(entries))
        })
        .collect()
}

/// One bar group on the comparison chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub metric: String,
    pub natural: f64,
    pub chemical: f64,
}

/// Six labelled rows, natural next to chemical, in dashboard order
pub fn comparison_rows(summary: &BTreeMap<MethodType, MetricSummary>) -> Vec<ComparisonRow> {
    let natural = summary.get(&MethodType::Natural).copied().unwrap_or_default();
    let chemical = summary.get(&MethodType::Chemical).copied().unwrap_or_default();

    let metrics: [(&str, fn(&MetricSummary) -> f64); 6] = [
        ("Yield Δ", |s| s.mean_yield_delta),
        ("Pest Red.", |s| s.mean_pest_reduction),
        ("Soil Health", |s| s.mean_soil_health),
        ("Cost (↓better)", |s| s.mean_cost),
        ("Pollinators", |s| s.mean_pollinator_impact),
        ("Recurrence %", |s| s.recurrence_rate_pct),
    ];

    metrics
        .iter()
        .map(|(label, pick)| ComparisonRow {
            metric: label.to_string(),
            natural: pick(&natural),
            chemical: pick(&chemical),
        })
        .collect()
}
