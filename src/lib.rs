//! # Insight
//!
//! Dataset query service - a full-stack Rust application for ingesting
//! tabular datasets (course sections, rooms) and evaluating JSON-encoded
//! structured queries against them.
//!
//! ## Features
//!
//! - **Filtering**: composable AND/OR/NOT trees with numeric comparisons
//!   and edge-wildcard string matching
//! - **Aggregation**: GROUP/APPLY with MAX, MIN, AVG, COUNT, and SUM,
//!   computed in exact decimal arithmetic
//! - **Snapshot isolation**: queries run against an immutable snapshot of
//!   the registry, unaffected by concurrent dataset changes
//! - **Persistence**: datasets are flushed to disk before they become
//!   visible and reloaded on startup
//!
//! ## Modules
//!
//! - [`dataset`]: dataset model, field registry, and the persistent store
//! - [`engine`]: query validation and evaluation
//! - [`ingest`]: payload decoding (zip course archives, room JSON)
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use insight::dataset::{Dataset, DatasetKind, DatasetStore};
//! use insight::engine::evaluate;
//! use insight::ingest::parse_payload;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DatasetStore::open("./insight_data").await?;
//!
//!     // Ingest a zip of course JSON files
//!     let payload = std::fs::read("courses.zip")?;
//!     let entries = parse_payload(DatasetKind::Sections, &payload)?;
//!     store.add(Dataset::new("courses", DatasetKind::Sections, entries)).await?;
//!
//!     // Evaluate a query against the current snapshot
//!     let query = serde_json::json!({
//!         "WHERE": {"GT": {"courses_avg": 90}},
//!         "OPTIONS": {"COLUMNS": ["courses_dept", "courses_avg"], "ORDER": "courses_avg"}
//!     });
//!     let rows = evaluate(&query, &*store.snapshot().await)?;
//!
//!     println!("Found {} rows", rows.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod ingest;

// Re-export top-level types for convenience
pub use dataset::{
    ColumnValue, Dataset, DatasetKind, DatasetStore, DatasetSummary, Entry, Field, Room, Section,
    Snapshot, StoreError, StoreResult,
};

pub use engine::{evaluate, EngineError, EngineResult, OutputRow, MAX_RESULTS};

pub use ingest::{parse_payload, IngestError, IngestResult};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig, StorageConfig};
