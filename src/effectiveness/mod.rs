//! Treatment outcome logs and the natural-vs-chemical comparison
//!
//! - `types`: log entries, create requests and patches
//! - `store`: `LogStore` seam with in-memory and JSON-file backends
//! - `aggregator`: per-method averages across six metrics

pub mod types;
pub mod store;
pub mod aggregator;

pub use types::{EffectivenessLogEntry, LogPatch, MethodType, NewLogEntry};
pub use store::{InMemoryLogStore, JsonFileLogStore, LogStore, StoreError, LOG_STORE_KEY};
pub use aggregator::{aggregate, comparison_rows, ComparisonRow, MetricSummary, LABOR_HOUR_COST};
