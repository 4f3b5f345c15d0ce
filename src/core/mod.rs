//! Pipeline stages and orchestration.
//!
//! - `ingest`: best-effort fetch + dedup into the store
//! - `filter`: score and categorize one hour of items
//! - `cluster`: partition valid items by primary category
//! - `script`: summarize clusters and assemble the bulletin text
//! - `audio`: turn unpublished broadcasts into stored audio
//! - `retry`: shared backoff and timeout helpers
//! - `orchestrator`: sequences one run per invocation

pub mod audio;
pub mod cluster;
pub mod filter;
pub mod ingest;
pub mod orchestrator;
pub mod retry;
pub mod script;

pub use audio::{AudioReport, AudioSettings};
pub use orchestrator::{Orchestrator, PipelineError, PipelineSettings, RunOutcome};
pub use retry::{retry_with_backoff, with_timeout, RetryPolicy};
