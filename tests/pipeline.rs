//! End-to-end pipeline runs against deterministic fake adapters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use bulletin::adapters::{
    AdapterError, ArtifactStorage, ContentSource, SpeechSynthesizer, Summarizer, SynthesizedAudio,
};
use bulletin::core::{
    Orchestrator, PipelineError, PipelineSettings, RetryPolicy, RunOutcome,
};
use bulletin::domain::FetchedPost;
use bulletin::Store;

// ----------------------------------------------------------------------
// Fakes
// ----------------------------------------------------------------------

/// Returns a fixed batch of posts; `fresh_ids` makes every call yield
/// previously unseen external ids.
struct FakeSource {
    posts: Vec<FetchedPost>,
    fresh_ids: bool,
    calls: AtomicU64,
}

impl FakeSource {
    fn new(posts: Vec<FetchedPost>) -> Self {
        Self {
            posts,
            fresh_ids: false,
            calls: AtomicU64::new(0),
        }
    }

    fn with_fresh_ids(posts: Vec<FetchedPost>) -> Self {
        Self {
            posts,
            fresh_ids: true,
            calls: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn fetch_latest(&self, _limit: usize) -> Result<Vec<FetchedPost>, AdapterError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let mut posts = self.posts.clone();
        if self.fresh_ids {
            for post in &mut posts {
                post.id = format!("{}-call{}", post.id, call);
            }
        }
        Ok(posts)
    }
}

struct DownSource;

#[async_trait]
impl ContentSource for DownSource {
    async fn fetch_latest(&self, _limit: usize) -> Result<Vec<FetchedPost>, AdapterError> {
        Err(AdapterError::Upstream("connection refused".to_string()))
    }
}

/// Maps category names found in the prompt to canned summaries.
struct FakeSummarizer;

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String, AdapterError> {
        if prompt.contains("about Economy") {
            Ok("Markets steadied after the latest inflation report.".to_string())
        } else if prompt.contains("about Politics") {
            Ok("Lawmakers advanced the new legislation.".to_string())
        } else {
            Ok("A quiet hour across other topics.".to_string())
        }
    }
}

struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(&self, _prompt: &str) -> Result<String, AdapterError> {
        Err(AdapterError::Upstream("summarizer down".to_string()))
    }
}

struct FakeTts;

#[async_trait]
impl SpeechSynthesizer for FakeTts {
    async fn synthesize(&self, _text: &str, _voice: &str) -> Result<SynthesizedAudio, AdapterError> {
        Ok(SynthesizedAudio {
            bytes: vec![0u8; 64],
            duration_secs: Some(1.0),
        })
    }
}

#[derive(Default)]
struct FakeStorage {
    uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl ArtifactStorage for FakeStorage {
    async fn upload(&self, key: &str, _bytes: Vec<u8>) -> Result<String, AdapterError> {
        self.uploads
            .lock()
            .unwrap()
            .push(key.to_string());
        Ok(format!("https://cdn.test/{key}"))
    }
}

// ----------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------

fn post(id: &str, author: &str, content: &str) -> FetchedPost {
    FetchedPost {
        id: id.to_string(),
        author: author.to_string(),
        verified: true,
        content: content.to_string(),
        timestamp: Utc::now(),
        engagement: 250,
    }
}

fn news_posts() -> Vec<FetchedPost> {
    vec![
        post(
            "econ-1",
            "marketdesk",
            "Stocks rallied as the market digested the latest inflation figures.",
        ),
        post(
            "econ-2",
            "wire",
            "Earnings season lifted the market despite recession worries.",
        ),
        post(
            "pol-1",
            "capitolwire",
            "Parliament scheduled a vote on the new legislation today.",
        ),
    ]
}

fn fast_settings() -> PipelineSettings {
    let mut settings = PipelineSettings::default();
    settings.retry = RetryPolicy {
        max_attempts: 2,
        initial_delay_ms: 5,
        max_delay_ms: 20,
        backoff_multiplier: 2.0,
    };
    settings.call_timeout = Duration::from_secs(2);
    settings
}

fn orchestrator(
    store: Arc<Store>,
    source: Arc<dyn ContentSource>,
    summarizer: Arc<dyn Summarizer>,
) -> Orchestrator {
    Orchestrator::new(
        store,
        source,
        summarizer,
        Arc::new(FakeTts),
        Arc::new(FakeStorage::default()),
        fast_settings(),
    )
}

// ----------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------

#[tokio::test]
async fn test_full_run_creates_broadcast() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let orchestrator = orchestrator(
        store.clone(),
        Arc::new(FakeSource::new(news_posts())),
        Arc::new(FakeSummarizer),
    );

    let hour = Orchestrator::current_hour_bucket();
    let outcome = orchestrator.run_hour(hour).await.unwrap();

    let broadcast = match outcome {
        RunOutcome::Created(b) => b,
        RunOutcome::NoContent => panic!("expected a broadcast"),
    };

    // Both cluster summaries, framed by the fixed preamble and sign-off
    assert!(broadcast
        .script
        .contains("Markets steadied after the latest inflation report."));
    assert!(broadcast
        .script
        .contains("Lawmakers advanced the new legislation."));
    assert!(broadcast.script.starts_with("Good day"));
    assert!(broadcast.script.contains("Stay tuned") || broadcast.script.contains("stay tuned"));

    // The two-item Economy cluster leads
    assert!(broadcast
        .script
        .contains("1. Markets steadied after the latest inflation report."));

    assert_eq!(broadcast.cluster_count, 2);
    assert_eq!(broadcast.item_count, 3);
    assert!(!broadcast.published);
    assert_eq!(
        broadcast.word_count,
        broadcast.script.split_whitespace().count() as i64
    );

    let status = store.status().unwrap();
    assert_eq!(status.raw_items, 3);
    assert_eq!(status.quality_scores, 3);
    assert_eq!(status.broadcasts, 1);
    assert_eq!(status.unprocessed_items, 0);
}

#[tokio::test]
async fn test_down_source_yields_no_content_not_error() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let orchestrator = orchestrator(store.clone(), Arc::new(DownSource), Arc::new(FakeSummarizer));

    let outcome = orchestrator
        .run_hour(Orchestrator::current_hour_bucket())
        .await
        .unwrap();

    assert!(matches!(outcome, RunOutcome::NoContent));
    assert_eq!(store.status().unwrap().broadcasts, 0);
}

#[tokio::test]
async fn test_duplicate_ingestion_stores_once() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let orchestrator = orchestrator(
        store.clone(),
        Arc::new(FakeSource::new(news_posts())),
        Arc::new(FakeSummarizer),
    );

    let hour = Orchestrator::current_hour_bucket();
    orchestrator.run_hour(hour).await.unwrap();

    // Same external ids come back; nothing new lands and the already
    // processed items are not re-evaluated
    let outcome = orchestrator.run_hour(hour).await.unwrap();
    assert!(matches!(outcome, RunOutcome::NoContent));
    assert_eq!(store.status().unwrap().raw_items, 3);
    assert_eq!(store.status().unwrap().broadcasts, 1);
}

#[tokio::test]
async fn test_second_run_for_same_hour_rejected() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    // Fresh ids each fetch, so the second run has its own valid items
    // and gets all the way to the broadcast insert
    let orchestrator = orchestrator(
        store.clone(),
        Arc::new(FakeSource::with_fresh_ids(news_posts())),
        Arc::new(FakeSummarizer),
    );

    let hour = Orchestrator::current_hour_bucket();
    orchestrator.run_hour(hour).await.unwrap();

    let err = orchestrator.run_hour(hour).await.unwrap_err();
    assert!(matches!(err, PipelineError::DuplicateHour(h) if h == hour));

    // The losing run left no partial broadcast behind
    assert_eq!(store.status().unwrap().broadcasts, 1);
}

#[tokio::test]
async fn test_summarizer_failure_falls_back_to_placeholder() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let orchestrator = orchestrator(
        store.clone(),
        Arc::new(FakeSource::new(news_posts())),
        Arc::new(FailingSummarizer),
    );

    let outcome = orchestrator
        .run_hour(Orchestrator::current_hour_bucket())
        .await
        .unwrap();

    let broadcast = match outcome {
        RunOutcome::Created(b) => b,
        RunOutcome::NoContent => panic!("expected a broadcast"),
    };

    // Placeholder summaries survive, the run does not abort
    assert!(broadcast.script.contains("2 updates in Economy"));
    assert!(broadcast.script.contains("1 updates in Politics"));
}
