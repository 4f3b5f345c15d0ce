//! Raw-byte uploads to object storage.

use async_trait::async_trait;

use super::{AdapterError, ArtifactStorage};

pub struct HttpArtifactStorage {
    /// Upload endpoint
    base_url: String,

    /// Base for the public URLs returned to callers
    public_url: String,

    api_key: String,
    client: reqwest::Client,
}

impl HttpArtifactStorage {
    pub fn new(base_url: String, public_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn public_object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

#[async_trait]
impl ArtifactStorage for HttpArtifactStorage {
    async fn upload(&self, key: &str, bytes: Vec<u8>) -> Result<String, AdapterError> {
        let response = self
            .client
            .put(self.object_url(key))
            .bearer_auth(&self.api_key)
            .header("content-type", "audio/mpeg")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AdapterError::Upstream(format!(
                "storage returned status {}",
                response.status()
            )));
        }

        Ok(self.public_object_url(key))
    }
}
