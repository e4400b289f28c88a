use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use vecsearch_common::{Result, VecSearchError};

use crate::provider::EmbeddingProvider;
use crate::types::{EmbedRequest, EmbedResponse};

/// HTTP embedding API client
///
/// Calls `POST {base_url}/embedding?text=...` and expects
/// `{"embedding": [f32, ...]}` back.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingClient {
    base_url: String,
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl HttpEmbeddingClient {
    /// Create new embedding client with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VecSearchError::config(format!("Failed to create HTTP client: {}", e)))?;

        info!("Embedding client initialized: {}", base_url);
        Ok(Self {
            base_url,
            client,
            max_attempts: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Allow up to `max_attempts` calls per embedding, backing off exponentially
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Base delay before the first retry
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Test connection to the embedding API
    pub async fn test_connection(&self) -> Result<bool> {
        let response = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| {
                VecSearchError::embedding_unavailable(format!(
                    "Failed to connect to embedding API: {}",
                    e
                ))
            })?;
        Ok(!response.status().is_server_error())
    }

    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embedding", self.base_url);
        let request = EmbedRequest { text };

        debug!("Generating embedding - Text length: {}", text.len());

        let mut attempt = 1;
        loop {
            match self.try_embed(&url, &request).await {
                Ok(embedding) => {
                    debug!("Received embedding - Dimension: {}", embedding.len());
                    return Ok(embedding);
                }
                // Only transport-level failures are worth another attempt
                Err(e @ VecSearchError::EmbeddingUnavailable(_)) if attempt < self.max_attempts => {
                    let delay = self.retry_delay * 2u32.pow(attempt - 1);
                    warn!(
                        "Embedding request failed (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt, self.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Single attempt to generate embedding
    async fn try_embed(&self, url: &str, request: &EmbedRequest<'_>) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(url)
            .query(request)
            .send()
            .await
            .map_err(|e| {
                VecSearchError::embedding_unavailable(format!(
                    "Failed to send embedding request: {}",
                    e
                ))
            })?
            .error_for_status()
            .map_err(|e| {
                VecSearchError::embedding_unavailable(format!("Embedding API error: {}", e))
            })?;

        let body = response.text().await.map_err(|e| {
            VecSearchError::embedding_unavailable(format!(
                "Failed to read embedding response: {}",
                e
            ))
        })?;

        let result: EmbedResponse = serde_json::from_str(&body).map_err(|e| {
            VecSearchError::embedding_malformed(format!(
                "Failed to parse embedding response: {}",
                e
            ))
        })?;

        result
            .validate()
            .map_err(VecSearchError::embedding_malformed)?;

        Ok(result.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_retry(text).await
    }
}
