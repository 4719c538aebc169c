//! Pest knowledge base
//!
//! Static catalog of pest records keyed by crop, with keywords, context
//! weights and authored natural-remedy steps. Leaf data only.

pub mod types;
pub mod catalog;

pub use types::{
    ContextSource, ContextTag, ContextWeight, CropSection, KbVariant, KnowledgeBase, PestRecord,
    RemedyCategory, RemedyStep,
};
pub use catalog::{fallback_steps, KnowledgeError, UNKNOWN_PEST};
