//! Environment-driven configuration.
//!
//! Required credentials must be present; a missing one is a
//! [`ConfigError`] at startup, never a silent default. Tunables
//! (threshold, page size, batch size) default sensibly.
//!
//! Variables:
//! - `BULLETIN_SOURCE_URL` (required) — social post feed
//! - `BULLETIN_SOURCE_TOKEN` — feed bearer token, optional
//! - `BULLETIN_SUMMARIZER_URL` — defaults to the hosted API
//! - `BULLETIN_SUMMARIZER_KEY` (required)
//! - `BULLETIN_TTS_URL` (required)
//! - `BULLETIN_TTS_KEY` (required)
//! - `BULLETIN_STORAGE_URL` (required) — upload endpoint
//! - `BULLETIN_STORAGE_PUBLIC_URL` — public base, defaults to the upload URL
//! - `BULLETIN_STORAGE_KEY` (required)
//! - `BULLETIN_DB_PATH` — defaults under the local data directory
//! - `BULLETIN_CONFIDENCE_THRESHOLD` — defaults to 0.6
//! - `BULLETIN_FETCH_PAGE_SIZE` — defaults to 100, capped at 200
//! - `BULLETIN_AUDIO_BATCH_SIZE` — defaults to 10

use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_SUMMARIZER_URL: &str = "https://api.anthropic.com";
const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;
const DEFAULT_FETCH_PAGE_SIZE: usize = 100;
const MAX_FETCH_PAGE_SIZE: usize = 200;
const DEFAULT_AUDIO_BATCH_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),

    #[error("could not determine a data directory for the database")]
    NoDataDir,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source_url: String,
    pub source_token: Option<String>,

    pub summarizer_url: String,
    pub summarizer_key: String,

    pub tts_url: String,
    pub tts_key: String,

    pub storage_url: String,
    pub storage_public_url: String,
    pub storage_key: String,

    pub db_path: PathBuf,

    pub confidence_threshold: f64,
    pub fetch_page_size: usize,
    pub audio_batch_size: usize,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage_url = required("BULLETIN_STORAGE_URL")?;
        let storage_public_url =
            optional("BULLETIN_STORAGE_PUBLIC_URL").unwrap_or_else(|| storage_url.clone());

        Ok(Self {
            source_url: required("BULLETIN_SOURCE_URL")?,
            source_token: optional("BULLETIN_SOURCE_TOKEN"),
            summarizer_url: optional("BULLETIN_SUMMARIZER_URL")
                .unwrap_or_else(|| DEFAULT_SUMMARIZER_URL.to_string()),
            summarizer_key: required("BULLETIN_SUMMARIZER_KEY")?,
            tts_url: required("BULLETIN_TTS_URL")?,
            tts_key: required("BULLETIN_TTS_KEY")?,
            storage_url,
            storage_public_url,
            storage_key: required("BULLETIN_STORAGE_KEY")?,
            db_path: db_path()?,
            confidence_threshold: parsed(
                "BULLETIN_CONFIDENCE_THRESHOLD",
                DEFAULT_CONFIDENCE_THRESHOLD,
            )?,
            fetch_page_size: parsed("BULLETIN_FETCH_PAGE_SIZE", DEFAULT_FETCH_PAGE_SIZE)?
                .min(MAX_FETCH_PAGE_SIZE),
            audio_batch_size: parsed("BULLETIN_AUDIO_BATCH_SIZE", DEFAULT_AUDIO_BATCH_SIZE)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        None => Ok(default),
    }
}

fn db_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = optional("BULLETIN_DB_PATH") {
        return Ok(PathBuf::from(path));
    }

    let dir = dirs::data_local_dir()
        .ok_or(ConfigError::NoDataDir)?
        .join("bulletin");
    std::fs::create_dir_all(&dir).map_err(|_| ConfigError::NoDataDir)?;
    Ok(dir.join("bulletin.db"))
}
