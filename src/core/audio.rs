//! Audio queue: turn unpublished broadcasts into stored audio.

use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapters::{ArtifactStorage, SpeechSynthesizer};
use crate::domain::Broadcast;
use crate::store::{Store, StoreError};

use super::retry::{retry_with_backoff, with_timeout, RetryPolicy};
use super::script::estimate_duration_secs;

/// Per-broadcast failure inside the batch. Never escapes this module;
/// the queue logs it and moves on.
#[derive(Debug, Error)]
enum BroadcastAudioError {
    #[error(transparent)]
    Adapter(#[from] crate::adapters::AdapterError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Knobs for one queue pass.
#[derive(Debug, Clone)]
pub struct AudioSettings {
    /// Maximum broadcasts per pass
    pub batch_size: usize,

    /// Voice handed to the synthesizer
    pub voice: String,

    /// Deadline for a single TTS call
    pub tts_timeout: Duration,

    /// Deadline for a single upload
    pub upload_timeout: Duration,

    pub retry: RetryPolicy,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            voice: "news_anchor".to_string(),
            tts_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// What one queue pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioReport {
    pub published: usize,
    pub failed: usize,
}

/// Process up to `settings.batch_size` unpublished broadcasts, oldest
/// hour first.
///
/// Broadcasts are independent: one failure is logged and the rest of
/// the batch continues. A failed broadcast stays unpublished and is
/// picked up again on the next invocation; there is no in-run retry of
/// a broadcast. Only a store failure while listing the queue aborts the
/// whole pass.
pub async fn process_queue(
    store: &Store,
    tts: &dyn SpeechSynthesizer,
    storage: &dyn ArtifactStorage,
    settings: &AudioSettings,
) -> Result<AudioReport, StoreError> {
    let pending = store.unpublished_broadcasts(settings.batch_size)?;

    if pending.is_empty() {
        info!("audio queue empty");
        return Ok(AudioReport::default());
    }

    let mut report = AudioReport::default();

    for broadcast in pending {
        match publish_one(store, tts, storage, settings, &broadcast).await {
            Ok(()) => report.published += 1,
            Err(e) => {
                error!(
                    broadcast_id = broadcast.id,
                    hour = %broadcast.hour,
                    error = %e,
                    "audio generation failed, broadcast stays unpublished"
                );
                report.failed += 1;
            }
        }
    }

    info!(
        published = report.published,
        failed = report.failed,
        "audio queue pass finished"
    );
    Ok(report)
}

async fn publish_one(
    store: &Store,
    tts: &dyn SpeechSynthesizer,
    storage: &dyn ArtifactStorage,
    settings: &AudioSettings,
    broadcast: &Broadcast,
) -> Result<(), BroadcastAudioError> {
    let audio = retry_with_backoff(&settings.retry, "synthesize_speech", || {
        with_timeout(
            settings.tts_timeout,
            tts.synthesize(&broadcast.script, &settings.voice),
        )
    })
    .await?;

    let key = object_key(broadcast);
    let size_bytes = audio.bytes.len() as i64;

    let bytes = audio.bytes;
    let url = retry_with_backoff(&settings.retry, "upload_audio", || {
        with_timeout(settings.upload_timeout, storage.upload(&key, bytes.clone()))
    })
    .await?;

    // Services that stream audio without metadata omit the duration;
    // estimate it from the script length
    let duration_secs = audio
        .duration_secs
        .unwrap_or_else(|| estimate_duration_secs(broadcast.word_count as usize));

    // An existing artifact means an earlier pass died between storing
    // the artifact and flipping the flag; keep that artifact and finish
    // the publish instead of wedging the broadcast forever
    match store.insert_audio_artifact(broadcast.id, &url, duration_secs, size_bytes, &settings.voice)
    {
        Ok(_) => {}
        Err(StoreError::Duplicate(_)) => {
            warn!(
                broadcast_id = broadcast.id,
                "artifact already stored, completing interrupted publish"
            );
        }
        Err(e) => return Err(e.into()),
    }
    store.mark_broadcast_published(broadcast.id)?;

    info!(
        broadcast_id = broadcast.id,
        %url,
        duration_secs,
        "broadcast published"
    );
    Ok(())
}

/// Freshly generated storage key for a broadcast's audio.
fn object_key(broadcast: &Broadcast) -> String {
    format!(
        "broadcasts/{}-{}.mp3",
        broadcast.hour.format("%Y%m%d%H"),
        Uuid::new_v4()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_object_key_shape() {
        let broadcast = Broadcast {
            id: 1,
            hour: Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap(),
            script: String::new(),
            excerpt: String::new(),
            cluster_count: 0,
            item_count: 0,
            word_count: 0,
            duration_secs: 0.0,
            published: false,
            created_at: Utc::now(),
        };

        let key = object_key(&broadcast);
        assert!(key.starts_with("broadcasts/2025060114-"));
        assert!(key.ends_with(".mp3"));

        // Keys are fresh per call
        assert_ne!(key, object_key(&broadcast));
    }
}
