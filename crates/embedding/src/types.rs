use serde::{Deserialize, Serialize};

/// Embedding API request, sent as the `text` query parameter
#[derive(Debug, Clone, Serialize)]
pub struct EmbedRequest<'a> {
    /// Text to embed
    pub text: &'a str,
}

/// Embedding API response
///
/// Any reply without a numeric `embedding` array fails to decode.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedResponse {
    /// Embedding vector
    pub embedding: Vec<f32>,
}

impl EmbedResponse {
    /// Check the decoded vector is usable for similarity scoring
    pub fn validate(&self) -> Result<(), String> {
        if self.embedding.is_empty() {
            return Err("empty embedding".to_string());
        }

        if let Some(pos) = self.embedding.iter().position(|v| !v.is_finite()) {
            return Err(format!("non-finite value at index {}", pos));
        }

        Ok(())
    }
}
