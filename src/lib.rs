//! bulletin - hourly audio news bulletin pipeline
//!
//! Turns a stream of short social posts into periodic audio news
//! bulletins. One invocation runs the content pipeline for a single
//! hour bucket; a separate invocation drains the audio queue.
//!
//! # Architecture
//!
//! The run is strictly sequential:
//! - ingestion deduplicates fetched posts into the store (best-effort)
//! - the filter stage scores and categorizes one hour of items
//! - clustering partitions valid items by primary category
//! - the script stage summarizes clusters and assembles the bulletin
//! - exactly one Broadcast row is inserted per hour (unique hour key)
//!
//! The audio queue runs independently, converting unpublished
//! broadcasts to speech with per-broadcast failure isolation.
//!
//! # Modules
//!
//! - `adapters`: clients for the feed, summarizer, TTS, and storage
//! - `analysis`: pure scoring and categorization
//! - `core`: pipeline stages, retry helpers, orchestration
//! - `store`: SQLite persistence with the uniqueness guarantees
//! - `config`: environment-driven configuration
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run the hourly content pipeline
//! bulletin run
//!
//! # Drain the audio queue
//! bulletin audio --limit 10
//!
//! # Store counts
//! bulletin status
//! ```

pub mod adapters;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod store;

// Re-export main types at crate root for convenience
pub use self::core::{Orchestrator, PipelineError, PipelineSettings, RunOutcome};
pub use domain::{AudioArtifact, Broadcast, Category, Cluster, QualityScore, RawItem};
pub use store::{Store, StoreError};
