//! Orchestrator: one sequential pipeline run per invocation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, DurationRound, Utc};
use thiserror::Error;
use tracing::{info, instrument};

use crate::adapters::{ArtifactStorage, ContentSource, SpeechSynthesizer, Summarizer};
use crate::domain::{Broadcast, NewBroadcast};
use crate::store::{Store, StoreError};

use super::audio::{self, AudioReport, AudioSettings};
use super::retry::RetryPolicy;
use super::{cluster, filter, ingest, script};

/// Failures that abort a pipeline run. The duplicate-hour case gets its
/// own variant so callers can treat a concurrent run as benign.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("a broadcast already exists for hour {0}")]
    DuplicateHour(DateTime<Utc>),

    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

/// What a pipeline run produced.
#[derive(Debug)]
pub enum RunOutcome {
    /// No valid items this hour; nothing was persisted
    NoContent,

    /// The hour's broadcast was created
    Created(Broadcast),
}

/// Tunables for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Confidence threshold when the store has none for a category
    pub default_threshold: f64,

    /// Page size for the content source fetch
    pub fetch_page_size: usize,

    /// Deadline for a single source or summarizer call
    pub call_timeout: Duration,

    pub retry: RetryPolicy,

    pub audio: AudioSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            default_threshold: 0.6,
            fetch_page_size: 100,
            call_timeout: Duration::from_secs(20),
            retry: RetryPolicy::default(),
            audio: AudioSettings::default(),
        }
    }
}

/// Sequences ingestion, filtering, clustering, script assembly, and
/// broadcast persistence. External capabilities are injected so tests
/// run against deterministic fakes.
pub struct Orchestrator {
    store: Arc<Store>,
    source: Arc<dyn ContentSource>,
    summarizer: Arc<dyn Summarizer>,
    tts: Arc<dyn SpeechSynthesizer>,
    storage: Arc<dyn ArtifactStorage>,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(
        store: Arc<Store>,
        source: Arc<dyn ContentSource>,
        summarizer: Arc<dyn Summarizer>,
        tts: Arc<dyn SpeechSynthesizer>,
        storage: Arc<dyn ArtifactStorage>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            source,
            summarizer,
            tts,
            storage,
            settings,
        }
    }

    /// The hour bucket a run started now would target: the boundary at
    /// the end of the current hour, so freshly ingested items fall in
    /// the `(hour - 1h, hour]` window.
    pub fn current_hour_bucket() -> DateTime<Utc> {
        let now = Utc::now();
        now.duration_trunc(chrono::Duration::hours(1))
            .unwrap_or(now)
            + chrono::Duration::hours(1)
    }

    /// Run the content pipeline for one hour bucket.
    ///
    /// Ingestion is best-effort; every later stage failure aborts the
    /// run with no partial broadcast. Two runs for the same hour cannot
    /// both succeed: the second insert fails on the unique hour.
    #[instrument(skip(self), fields(hour = %hour))]
    pub async fn run_hour(&self, hour: DateTime<Utc>) -> Result<RunOutcome, PipelineError> {
        info!("starting pipeline run");

        ingest::run(
            self.store.as_ref(),
            self.source.as_ref(),
            &self.settings.retry,
            self.settings.fetch_page_size,
            self.settings.call_timeout,
        )
        .await;

        let valid = filter::run(
            self.store.as_ref(),
            hour,
            self.settings.default_threshold,
        )?;

        if valid.is_empty() {
            info!("no valid items this hour, skipping broadcast");
            return Ok(RunOutcome::NoContent);
        }

        let mut clusters = cluster::run(valid);

        script::summarize_clusters(
            &mut clusters,
            self.summarizer.as_ref(),
            &self.settings.retry,
            self.settings.call_timeout,
        )
        .await;

        let draft = script::assemble(&clusters);

        let broadcast = self
            .store
            .insert_broadcast(&NewBroadcast {
                hour,
                script: draft.text,
                excerpt: draft.excerpt,
                cluster_count: draft.cluster_count,
                item_count: draft.item_count,
                word_count: draft.word_count,
                duration_secs: draft.duration_secs,
            })
            .map_err(|e| match e {
                StoreError::Duplicate(_) => PipelineError::DuplicateHour(hour),
                other => PipelineError::Store(other),
            })?;

        info!(
            broadcast_id = broadcast.id,
            clusters = broadcast.cluster_count,
            items = broadcast.item_count,
            words = broadcast.word_count,
            "broadcast created"
        );

        Ok(RunOutcome::Created(broadcast))
    }

    /// Process the unpublished-broadcast queue once.
    pub async fn process_audio_queue(&self) -> Result<AudioReport, StoreError> {
        audio::process_queue(
            self.store.as_ref(),
            self.tts.as_ref(),
            self.storage.as_ref(),
            &self.settings.audio,
        )
        .await
    }
}
