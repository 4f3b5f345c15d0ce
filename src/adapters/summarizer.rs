//! Client for the generative summarization service.
//!
//! Speaks a messages-style API: a prompt goes out with a bounded output
//! length and low temperature, the summary comes back as the first
//! content block. Anything else is a malformed response and the caller
//! falls back to the cluster's placeholder summary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AdapterError, Summarizer};

const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
const MAX_TOKENS: u32 = 256;
const TEMPERATURE: f64 = 0.3;

#[derive(Serialize)]
struct SummaryRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct SummaryResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

pub struct GenerativeSummarizer {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GenerativeSummarizer {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

#[async_trait]
impl Summarizer for GenerativeSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String, AdapterError> {
        let request = SummaryRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Upstream(format!(
                "summarizer returned {status}: {}",
                body.trim()
            )));
        }

        let parsed: SummaryResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::Malformed(e.to_string()))?;

        let text = parsed
            .content
            .first()
            .map(|block| block.text.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AdapterError::Malformed(
                "summarizer response had no content".to_string(),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url() {
        let summarizer =
            GenerativeSummarizer::new("https://api.example.com/".to_string(), "k".to_string());
        assert_eq!(summarizer.messages_url(), "https://api.example.com/v1/messages");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"content": [{"text": "  Two factual sentences.  "}]}"#;
        let parsed: SummaryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.content[0].text.trim(), "Two factual sentences.");
    }
}
