//! # Exercise Catalog
//!
//! Exercise catalog service and image-to-exercise matcher:
//! - Versioned exercise records (flat v1, rich v2) over SQLite or JSON storage
//! - Filename-to-exercise matching with deterministic tie-breaking
//! - JSON/CSV mapping artifacts, audit report and catalog update step
//! - Multiple interfaces: Rust library, HTTP API, CLI
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use exercise_catalog::{ImageMatcher, MatcherConfig, Snapshot};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MatcherConfig::default();
//!     let snapshot = Snapshot::load(config.images.load(), &config.record_sources()).await;
//!
//!     let run = ImageMatcher::new(config.priority()).run(&snapshot);
//!     exercise_catalog::report::emit(&run.entries, &config.artifact_paths())?;
//!
//!     println!("Matched {}/{} images", run.summary.matched, run.summary.processed);
//!     Ok(())
//! }
//! ```

pub mod apply;
pub mod catalog;
pub mod config;
pub mod core;
pub mod error;
pub mod matching;
pub mod persist;
pub mod pipeline;
pub mod report;
pub mod sources;
pub mod store;

// Re-export primary types
pub use catalog::{CatalogService, CatalogStats, MigrationOutcome, V1Filter, V2Query};
pub use config::{MatcherConfig, ServerConfig};
pub use core::{
    CandidateMatch, ExerciseRecord, ExerciseV1, ExerciseV2, ImageAsset, MappingEntry, SourceId,
};
pub use error::{CatalogError, Result};
pub use matching::SourcePriority;
pub use pipeline::{ImageMatcher, MatchRun, MatchSummary};
pub use sources::{RecordSource, Snapshot};
pub use store::{open_store, CatalogStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
