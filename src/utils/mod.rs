//! Utility modules shared by the scorer, aggregator and HTTP layer
//!
//! - Normalization: confidence scaling and safe means
//! - Text: request field coercion and keyword matching

pub mod normalization;
pub mod text;

// Re-export commonly used helpers
pub use normalization::{mean_or_zero, normalize_confidence, round_to};
pub use text::{count_keyword_hits, search_text, string_field};
