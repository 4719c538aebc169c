use serde::{Deserialize, Serialize};

/// Remedy category shown to the farmer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemedyCategory {
    Bio,
    Cultural,
    Predator,
}

impl RemedyCategory {
    pub const ALL: [RemedyCategory; 3] = [Self::Bio, Self::Cultural, Self::Predator];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bio => "Bio-control",
            Self::Cultural => "Cultural",
            Self::Predator => "Predator conservation",
        }
    }
}

/// One natural-treatment action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemedyStep {
    pub title: String,
    pub detail: String,
    pub timing: String,
    pub category: RemedyCategory,
}

impl RemedyStep {
    pub fn new(title: &str, detail: &str, timing: &str, category: RemedyCategory) -> Self {
        Self {
            title: title.to_string(),
            detail: detail.to_string(),
            timing: timing.to_string(),
            category,
        }
    }
}

/// Which free-text field a context tag is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    Weather,
    Stage,
}

/// Condition tag that carries a per-pest score bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextTag {
    Humid,
    Warm,
    Cool,
    Wet,
    Vegetative,
    Reproductive,
}

impl ContextTag {
    pub fn source(&self) -> ContextSource {
        match self {
            Self::Humid | Self::Warm | Self::Cool | Self::Wet => ContextSource::Weather,
            Self::Vegetative | Self::Reproductive => ContextSource::Stage,
        }
    }

    /// Lower-case phrases that trigger the tag (any one is enough)
    pub fn triggers(&self) -> &'static [&'static str] {
        match self {
            Self::Humid => &["humid"],
            Self::Warm => &["warm", "hot"],
            Self::Cool => &["cool", "cold"],
            Self::Wet => &["rain", "wet"],
            Self::Vegetative => &["veget"],
            Self::Reproductive => &["repro"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Humid => "humid",
            Self::Warm => "warm",
            Self::Cool => "cool",
            Self::Wet => "wet",
            Self::Vegetative => "vegetative",
            Self::Reproductive => "reproductive",
        }
    }

    /// True when any trigger phrase occurs in the already lower-cased text
    pub fn matches(&self, lowered: &str) -> bool {
        self.triggers().iter().any(|t| lowered.contains(t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextWeight {
    pub tag: ContextTag,
    pub weight: f64,
}

/// A pest entry in the knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PestRecord {
    pub name: String,
    /// Lower-case crop words this pest applies to
    #[serde(rename = "crops")]
    pub applicable_crops: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub context_weights: Vec<ContextWeight>,
    pub remedy_steps: Vec<RemedyStep>,
}

impl PestRecord {
    /// Crop-list match: some registered crop word occurs in the lower-cased query crop
    pub fn applies_to(&self, crop_lowered: &str) -> bool {
        !crop_lowered.is_empty()
            && self
                .applicable_crops
                .iter()
                .any(|c| !c.is_empty() && crop_lowered.contains(c.to_lowercase().as_str()))
    }
}

/// Pests registered under one crop key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropSection {
    pub key: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub pests: Vec<PestRecord>,
}

impl CropSection {
    /// Case-insensitive: the key or any alias occurs in the lower-cased query crop
    pub fn matches_crop(&self, crop_lowered: &str) -> bool {
        if crop_lowered.is_empty() {
            return false;
        }
        std::iter::once(&self.key)
            .chain(self.aliases.iter())
            .any(|name| !name.is_empty() && crop_lowered.contains(name.to_lowercase().as_str()))
    }
}

/// How the scorer picks candidate pests for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KbVariant {
    /// Every pest carries its own crop list; candidates are filtered by it
    CropList,
    /// Pests live under a crop key; candidates are the pests of the resolved key
    CropScoped,
}

impl std::str::FromStr for KbVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "crop_list" | "flat" => Ok(Self::CropList),
            "crop_scoped" | "scoped" => Ok(Self::CropScoped),
            other => Err(format!("unknown knowledge base variant '{}'", other)),
        }
    }
}

/// Immutable catalog of pests and their remedies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub variant: KbVariant,
    pub sections: Vec<CropSection>,
}

impl KnowledgeBase {
    /// All pests in insertion order, paired with their section key
    pub fn pests(&self) -> impl Iterator<Item = (&str, &PestRecord)> {
        self.sections
            .iter()
            .flat_map(|s| s.pests.iter().map(move |p| (s.key.as_str(), p)))
    }

    pub fn pest_count(&self) -> usize {
        self.sections.iter().map(|s| s.pests.len()).sum()
    }

    /// First section whose key or alias matches the query crop
    pub fn resolve_crop(&self, crop: &str) -> Option<&CropSection> {
        let lowered = crop.trim().to_lowercase();
        // Exact key first so "Rice" never resolves to a longer key containing it
        self.sections
            .iter()
            .find(|s| s.key.to_lowercase() == lowered)
            .or_else(|| self.sections.iter().find(|s| s.matches_crop(&lowered)))
    }

    /// Look up a pest by name, optionally restricted to a crop key
    pub fn find_pest(&self, pest_name: &str, crop_key: Option<&str>) -> Option<&PestRecord> {
        let wanted = pest_name.trim().to_lowercase();
        self.sections
            .iter()
            .filter(|s| match crop_key {
                Some(key) => s.key.eq_ignore_ascii_case(key.trim()),
                None => true,
            })
            .flat_map(|s| s.pests.iter())
            .find(|p| p.name.to_lowercase() == wanted)
    }

    pub fn crop_keys(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.key.as_str()).collect()
    }
}
