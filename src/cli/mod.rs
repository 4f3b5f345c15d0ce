//! Command-line interface for the bulletin pipeline.
//!
//! One subcommand per scheduled entrypoint: `run` for the hourly
//! content pipeline, `audio` for the unpublished-broadcast queue, and
//! `status` for store counts.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, DurationRound, Utc};
use clap::{Parser, Subcommand};

use crate::adapters::{
    GenerativeSummarizer, HttpArtifactStorage, HttpContentSource, HttpSpeechSynthesizer,
};
use crate::config::Config;
use crate::core::{Orchestrator, PipelineSettings, RunOutcome};
use crate::store::Store;

/// bulletin - hourly audio news bulletin pipeline
#[derive(Parser, Debug)]
#[command(name = "bulletin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the content pipeline for one hour bucket
    Run {
        /// Target hour as RFC 3339 (e.g. 2025-06-01T14:00:00Z);
        /// defaults to the bucket covering now
        #[arg(long)]
        hour: Option<String>,
    },

    /// Convert unpublished broadcasts to audio
    Audio {
        /// Maximum broadcasts to process this pass
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show store counts
    Status,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = Config::from_env().context("configuration error")?;
        let store = Arc::new(Store::open(&config.db_path).context("failed to open store")?);

        match self.command {
            Commands::Run { hour } => {
                let hour = match hour {
                    Some(raw) => parse_hour(&raw)?,
                    None => Orchestrator::current_hour_bucket(),
                };

                let orchestrator = build_orchestrator(&config, store);
                match orchestrator.run_hour(hour).await? {
                    RunOutcome::NoContent => {
                        println!("No valid items for {hour}; no broadcast created.");
                    }
                    RunOutcome::Created(broadcast) => {
                        println!(
                            "Broadcast {} created for {}: {} clusters, {} items, {} words.",
                            broadcast.id,
                            broadcast.hour,
                            broadcast.cluster_count,
                            broadcast.item_count,
                            broadcast.word_count
                        );
                    }
                }
            }

            Commands::Audio { limit } => {
                let mut settings = PipelineSettings::default();
                settings.audio.batch_size = limit;

                let orchestrator = build_orchestrator_with(&config, store, settings);
                let report = orchestrator.process_audio_queue().await?;
                println!(
                    "Audio queue pass: {} published, {} failed.",
                    report.published, report.failed
                );
            }

            Commands::Status => {
                let status = store.status()?;
                println!("Raw items:              {}", status.raw_items);
                println!("  unprocessed:          {}", status.unprocessed_items);
                println!("Quality scores:         {}", status.quality_scores);
                println!("Broadcasts:             {}", status.broadcasts);
                println!("  awaiting audio:       {}", status.unpublished_broadcasts);
                println!("Audio artifacts:        {}", status.audio_artifacts);
            }
        }

        Ok(())
    }
}

fn build_orchestrator(config: &Config, store: Arc<Store>) -> Orchestrator {
    let mut settings = PipelineSettings::default();
    settings.default_threshold = config.confidence_threshold;
    settings.fetch_page_size = config.fetch_page_size;
    settings.audio.batch_size = config.audio_batch_size;
    build_orchestrator_with(config, store, settings)
}

fn build_orchestrator_with(
    config: &Config,
    store: Arc<Store>,
    settings: PipelineSettings,
) -> Orchestrator {
    Orchestrator::new(
        store,
        Arc::new(HttpContentSource::new(
            config.source_url.clone(),
            config.source_token.clone(),
        )),
        Arc::new(GenerativeSummarizer::new(
            config.summarizer_url.clone(),
            config.summarizer_key.clone(),
        )),
        Arc::new(HttpSpeechSynthesizer::new(
            config.tts_url.clone(),
            config.tts_key.clone(),
        )),
        Arc::new(HttpArtifactStorage::new(
            config.storage_url.clone(),
            config.storage_public_url.clone(),
            config.storage_key.clone(),
        )),
        settings,
    )
}

/// Parse an hour argument and snap it to its hour boundary.
fn parse_hour(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid hour '{raw}', expected RFC 3339"))?
        .with_timezone(&Utc);

    parsed
        .duration_trunc(chrono::Duration::hours(1))
        .context("hour out of range")
}
