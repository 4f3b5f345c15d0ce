//! Clients for the external services the pipeline depends on.
//!
//! Each dependency sits behind a small capability trait so stages take
//! injected handles instead of module-global clients, and tests swap in
//! deterministic fakes. The concrete implementations are thin reqwest
//! clients.

pub mod source;
pub mod storage;
pub mod summarizer;
pub mod tts;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::FetchedPost;

pub use source::HttpContentSource;
pub use storage::HttpArtifactStorage;
pub use summarizer::GenerativeSummarizer;
pub use tts::HttpSpeechSynthesizer;

/// Failures from outbound calls. `Timeout` is its own variant so
/// callers can tell an expired deadline from an unreachable or
/// misbehaving upstream.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream unavailable: {0}")]
    Upstream(String),

    #[error("unexpected response shape: {0}")]
    Malformed(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AdapterError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AdapterError::Timeout(_))
    }
}

/// The social post feed. Best-effort: the pipeline proceeds on stored
/// items when a fetch fails.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch up to `limit` recent posts.
    async fn fetch_latest(&self, limit: usize) -> Result<Vec<FetchedPost>, AdapterError>;
}

/// The generative text service used for cluster summaries.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Submit a prompt, get the response text back.
    async fn summarize(&self, prompt: &str) -> Result<String, AdapterError>;
}

/// Synthesized speech returned by the TTS service.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// Raw audio bytes (mp3)
    pub bytes: Vec<u8>,

    /// Duration in seconds, when the service reports it
    pub duration_secs: Option<f64>,
}

/// The text-to-speech service.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<SynthesizedAudio, AdapterError>;
}

/// Object storage for finished audio.
#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    /// Upload raw bytes under `key`, returning the public URL.
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<String, AdapterError>;
}
