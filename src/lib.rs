//! Pest Advisor Rust Implementation
//!
//! Field-report pest diagnosis with natural remedy guidance and a treatment
//! effectiveness log.
//!
//! Layout:
//! - `utils/`: Confidence normalization and text helpers
//! - `knowledge/`: Pest catalogs (crop-list and crop-scoped variants)
//! - `scorer`: Keyword/context heuristic ranking pests for a report
//! - `recommendation`: Remedy steps and bio/cultural/predator grouping
//! - `guidance`: Plain-text instructions for display, read-aloud and translation
//! - `effectiveness/`: Outcome logs, storage and per-method comparison
//! - `translation/`: Text generation provider and translation (feature `api`)
//! - `api_server`: Axum endpoints (feature `api`)

pub mod utils;
pub mod knowledge;
pub mod scorer;
pub mod recommendation;
pub mod guidance;
pub mod effectiveness;

#[cfg(feature = "api")]
pub mod translation;

#[cfg(feature = "api")]
pub mod config;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use knowledge::{KbVariant, KnowledgeBase, PestRecord, RemedyCategory, RemedyStep};
pub use scorer::{score, DiagnosisQuery, DiagnosisResult, DiagnosisScorer, ScoringConfig};
pub use recommendation::{remedy_steps_for, RemedyGroups};
pub use guidance::GuidanceComposer;
pub use effectiveness::{aggregate, EffectivenessLogEntry, LogStore, MethodType, MetricSummary};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};

#[cfg(feature = "api")]
pub use config::AppConfig;
