use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Treatment family being compared on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodType {
    #[default]
    #[serde(alias = "Natural")]
    Natural,
    #[serde(alias = "Chemical")]
    Chemical,
}

impl MethodType {
    pub const ALL: [MethodType; 2] = [Self::Natural, Self::Chemical];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Natural => "Natural",
            Self::Chemical => "Chemical",
        }
    }
}

/// One recorded treatment outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivenessLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub crop: String,
    pub pest: String,
    pub method_type: MethodType,
    pub cost_input: f64,
    pub labor_hours: f64,
    pub yield_before: f64,
    pub yield_after: f64,
    pub pest_count_before: f64,
    pub pest_count_after: f64,
    /// Field-test summary, 0-100
    pub soil_health_score: f64,
    pub pollinator_count: f64,
    #[serde(rename = "recurrenceWithin60Days")]
    pub recurrence_within_60_days: bool,
}

impl EffectivenessLogEntry {
    /// Range checks applied on create and after every patch
    pub fn validate(&self) -> Result<(), String> {
        let numeric = [
            ("costInput", self.cost_input),
            ("laborHours", self.labor_hours),
            ("yieldBefore", self.yield_before),
            ("yieldAfter", self.yield_after),
            ("pestCountBefore", self.pest_count_before),
            ("pestCountAfter", self.pest_count_after),
            ("soilHealthScore", self.soil_health_score),
            ("pollinatorCount", self.pollinator_count),
        ];
        if let Some((name, _)) = numeric.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{} must be a finite number", name));
        }
        if !(0.0..=100.0).contains(&self.soil_health_score) {
            return Err(format!(
                "soilHealthScore must be within 0-100, got {}",
                self.soil_health_score
            ));
        }
        Ok(())
    }
}

/// Create request: every field optional, id and timestamp generated when absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewLogEntry {
    pub id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub crop: String,
    pub pest: String,
    pub method_type: MethodType,
    pub cost_input: f64,
    pub labor_hours: f64,
    pub yield_before: f64,
    pub yield_after: f64,
    pub pest_count_before: f64,
    pub pest_count_after: f64,
    pub soil_health_score: f64,
    pub pollinator_count: f64,
    #[serde(rename = "recurrenceWithin60Days")]
    pub recurrence_within_60_days: bool,
}

impl NewLogEntry {
    pub fn into_entry(self) -> EffectivenessLogEntry {
        EffectivenessLogEntry {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            crop: self.crop.trim().to_string(),
            pest: self.pest.trim().to_string(),
            method_type: self.method_type,
            cost_input: self.cost_input,
            labor_hours: self.labor_hours,
            yield_before: self.yield_before,
            yield_after: self.yield_after,
            pest_count_before: self.pest_count_before,
            pest_count_after: self.pest_count_after,
            soil_health_score: self.soil_health_score,
            pollinator_count: self.pollinator_count,
            recurrence_within_60_days: self.recurrence_within_60_days,
        }
    }
}

/// Partial update; `None` leaves the field unchanged. The id never changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogPatch {
    pub timestamp: Option<DateTime<Utc>>,
    pub crop: Option<String>,
    pub pest: Option<String>,
    pub method_type: Option<MethodType>,
    pub cost_input: Option<f64>,
    pub labor_hours: Option<f64>,
    pub yield_before: Option<f64>,
    pub yield_after: Option<f64>,
    pub pest_count_before: Option<f64>,
    pub pest_count_after: Option<f64>,
    pub soil_health_score: Option<f64>,
    pub pollinator_count: Option<f64>,
    #[serde(rename = "recurrenceWithin60Days")]
    pub recurrence_within_60_days: Option<bool>,
}

impl LogPatch {
    /// Copy of `entry` with the patch applied; `entry` is left untouched
    pub fn applied_to(&self, entry: &EffectivenessLogEntry) -> EffectivenessLogEntry {
        let mut candidate = entry.clone();
        self.apply(&mut candidate);
        candidate
    }

    pub fn apply(&self, entry: &mut EffectivenessLogEntry) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut entry.timestamp, &self.timestamp);
        set(&mut entry.crop, &self.crop);
        set(&mut entry.pest, &self.pest);
        set(&mut entry.method_type, &self.method_type);
        set(&mut entry.cost_input, &self.cost_input);
        set(&mut entry.labor_hours, &self.labor_hours);
        set(&mut entry.yield_before, &self.yield_before);
        set(&mut entry.yield_after, &self.yield_after);
        set(&mut entry.pest_count_before, &self.pest_count_before);
        set(&mut entry.pest_count_after, &self.pest_count_after);
        set(&mut entry.soil_health_score, &self.soil_health_score);
        set(&mut entry.pollinator_count, &self.pollinator_count);
        set(&mut entry.recurrence_within_60_days, &self.recurrence_within_60_days);
    }
}
