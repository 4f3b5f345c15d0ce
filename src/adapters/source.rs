//! HTTP client for the social post feed.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::FetchedPost;

use super::{AdapterError, ContentSource};

/// Feed response envelope.
#[derive(Debug, Deserialize)]
struct SourceEnvelope {
    success: bool,
    #[serde(default)]
    data: Vec<FetchedPost>,
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpContentSource {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpContentSource {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn posts_url(&self, limit: usize) -> String {
        format!("{}/posts/latest?limit={}", self.base_url, limit)
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch_latest(&self, limit: usize) -> Result<Vec<FetchedPost>, AdapterError> {
        let mut request = self.client.get(self.posts_url(limit));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(AdapterError::Upstream(format!(
                "feed returned status {}",
                response.status()
            )));
        }

        let envelope: SourceEnvelope = response
            .json()
            .await
            .map_err(|e| AdapterError::Malformed(e.to_string()))?;

        if !envelope.success {
            return Err(AdapterError::Upstream(
                envelope.error.unwrap_or_else(|| "feed reported failure".to_string()),
            ));
        }

        Ok(envelope.data)
    }
}
