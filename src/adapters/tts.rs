//! Client for the text-to-speech service.

use async_trait::async_trait;
use serde::Serialize;

use super::{AdapterError, SpeechSynthesizer, SynthesizedAudio};

/// Header the service sets when it knows the rendered duration.
const DURATION_HEADER: &str = "x-audio-duration-secs";

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice: &'a str,
    speed: f64,
    format: &'a str,
}

pub struct HttpSpeechSynthesizer {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpSpeechSynthesizer {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn synthesize_url(&self) -> String {
        format!("{}/v1/synthesize", self.base_url)
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<SynthesizedAudio, AdapterError> {
        let request = SynthesisRequest {
            text,
            voice,
            speed: 1.0,
            format: "mp3",
        };

        let response = self
            .client
            .post(self.synthesize_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        // Non-success is a hard per-item error; the queue logs it and
        // moves on to the next broadcast
        if !response.status().is_success() {
            return Err(AdapterError::Upstream(format!(
                "tts returned status {}",
                response.status()
            )));
        }

        let duration_secs = response
            .headers()
            .get(DURATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok());

        let bytes = response.bytes().await?.to_vec();

        if bytes.is_empty() {
            return Err(AdapterError::Malformed("tts returned no audio".to_string()));
        }

        Ok(SynthesizedAudio {
            bytes,
            duration_secs,
        })
    }
}
