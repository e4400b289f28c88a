use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vecsearch_common::{Result, VecSearchError};

/// Fixed-length embedding vector
///
/// Constructed values are never empty and hold only finite numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    /// Build a vector from caller-supplied values
    pub fn new(values: Vec<f32>) -> Result<Self> {
        match Self::problem(&values) {
            Some(msg) => Err(VecSearchError::invalid_input(msg)),
            None => Ok(Self(values)),
        }
    }

    /// Build a vector from embedding provider output
    pub(crate) fn from_provider(values: Vec<f32>) -> Result<Self> {
        match Self::problem(&values) {
            Some(msg) => Err(VecSearchError::embedding_malformed(msg)),
            None => Ok(Self(values)),
        }
    }

    fn problem(values: &[f32]) -> Option<String> {
        if values.is_empty() {
            return Some("embedding vector is empty".to_string());
        }
        values
            .iter()
            .position(|v| !v.is_finite())
            .map(|pos| format!("embedding has a non-finite value at index {}", pos))
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl TryFrom<Vec<f32>> for EmbeddingVector {
    type Error = VecSearchError;

    fn try_from(values: Vec<f32>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<EmbeddingVector> for Vec<f32> {
    fn from(vector: EmbeddingVector) -> Self {
        vector.0
    }
}

/// Persisted document: id, text and embedding, all fixed at creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    id: String,
    content: String,
    embedding: EmbeddingVector,
}

impl DocumentRecord {
    /// Create record with a freshly assigned id
    pub fn new(content: impl Into<String>, embedding: EmbeddingVector) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), content, embedding)
    }

    /// Create record with a known id (e.g. when loading from a store)
    pub fn with_id(
        id: impl Into<String>,
        content: impl Into<String>,
        embedding: EmbeddingVector,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            embedding,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn embedding(&self) -> &EmbeddingVector {
        &self.embedding
    }
}

/// Query-scoped search hit; carries no embedding and is never persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    /// Document ID
    pub id: String,

    /// Document text
    pub content: String,

    /// Cosine similarity to the query (-1.0 to 1.0)
    pub score: f32,
}

impl ScoredDocument {
    pub(crate) fn from_record(record: &DocumentRecord, score: f32) -> Self {
        Self {
            id: record.id.clone(),
            content: record.content.clone(),
            score,
        }
    }
}

/// Ordered outcome of one query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedResult {
    /// Hits, best first
    pub hits: Vec<ScoredDocument>,

    /// Ids of corpus records skipped for a dimension mismatch
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl RankedResult {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredDocument> {
        self.hits.iter()
    }
}

impl IntoIterator for RankedResult {
    type Item = ScoredDocument;
    type IntoIter = std::vec::IntoIter<ScoredDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}

/// What the query is compared by
#[derive(Debug, Clone, PartialEq)]
pub enum QueryInput {
    /// Raw text, embedded through the provider
    Text(String),

    /// Precomputed query vector
    Vector(EmbeddingVector),
}

/// Search request
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub input: QueryInput,

    /// Minimum score; engine default when `None`
    pub threshold: Option<f32>,

    /// Maximum number of hits; engine default when `None`
    pub top_k: Option<usize>,
}

impl QueryRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            input: QueryInput::Text(text.into()),
            threshold: None,
            top_k: None,
        }
    }

    pub fn vector(vector: EmbeddingVector) -> Self {
        Self {
            input: QueryInput::Vector(vector),
            threshold: None,
            top_k: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}
