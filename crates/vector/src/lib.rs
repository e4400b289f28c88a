//! vecsearch vector search engine
//!
//! Cosine similarity scoring, threshold/top-k ranking over corpus
//! snapshots, and the ingest/query paths that tie the embedding provider
//! and document store together.

mod corpus;
mod engine;
mod ranking;
mod similarity;
mod store;
mod types;

pub use corpus::CorpusAccessor;
pub use engine::VectorSearchEngine;
pub use ranking::RankingEngine;
pub use similarity::{cosine_similarity, QueryScorer};
pub use store::{DocumentStore, JsonFileStore, MemoryDocumentStore};
pub use types::{
    DocumentRecord, EmbeddingVector, QueryInput, QueryRequest, RankedResult, ScoredDocument,
};
pub use vecsearch_common::MismatchPolicy;
pub use tokio_util::sync::CancellationToken;
