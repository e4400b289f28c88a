use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vecsearch_common::{AppConfig, Result, SearchDefaults, VecSearchError};
use vecsearch_embedding::EmbeddingProvider;

use crate::corpus::CorpusAccessor;
use crate::ranking::RankingEngine;
use crate::store::DocumentStore;
use crate::types::{DocumentRecord, EmbeddingVector, QueryInput, QueryRequest, RankedResult};

/// Vector search engine
///
/// Holds no corpus state of its own: every query ranks a fresh snapshot
/// from the store. A query running alongside an ingestion may or may not
/// see the new record.
pub struct VectorSearchEngine {
    provider: Arc<dyn EmbeddingProvider>,
    corpus: CorpusAccessor,
    ranking: RankingEngine,
    defaults: SearchDefaults,
    embedding_timeout: Duration,
}

impl VectorSearchEngine {
    /// Create new vector search engine
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        corpus: CorpusAccessor,
        defaults: SearchDefaults,
        embedding_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            corpus,
            ranking: RankingEngine::new(defaults.mismatch_policy),
            defaults,
            embedding_timeout,
        }
    }

    /// Create engine with timeouts and ranking defaults from configuration
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        info!(
            "Vector search engine initialized - threshold={}, top_k={}, mismatch_policy={:?}",
            config.similarity_threshold, config.top_k, config.mismatch_policy
        );

        Self::new(
            provider,
            CorpusAccessor::new(store, config.store_timeout()),
            config.search_defaults(),
            config.embedding_timeout(),
        )
    }

    pub fn defaults(&self) -> SearchDefaults {
        self.defaults
    }

    /// Embed `content` and append it to the corpus
    ///
    /// Not retried on failure.
    pub async fn ingest(&self, content: &str) -> Result<DocumentRecord> {
        if content.trim().is_empty() {
            return Err(VecSearchError::invalid_input("Document content cannot be empty"));
        }

        debug!("Ingesting document - Content length: {}", content.len());

        let embedding = self.embed(content).await?;
        let record = DocumentRecord::new(content, embedding);
        self.corpus.append(record.clone()).await?;

        info!(
            "Document ingested: {} (dimension {})",
            record.id(),
            record.embedding().dimension()
        );
        Ok(record)
    }

    /// Ingest each content in order, stopping at the first failure
    ///
    /// Records ingested before the failure stay in the corpus.
    pub async fn ingest_batch<S: AsRef<str>>(&self, contents: &[S]) -> Result<Vec<DocumentRecord>> {
        if let Some(pos) = contents.iter().position(|c| c.as_ref().trim().is_empty()) {
            return Err(VecSearchError::invalid_input(format!(
                "Document content at position {} is empty",
                pos
            )));
        }

        let mut records = Vec::with_capacity(contents.len());
        for content in contents {
            records.push(self.ingest(content.as_ref()).await?);
        }

        info!("Batch ingestion completed - {} documents", records.len());
        Ok(records)
    }

    /// Search for similar documents
    pub async fn query(&self, request: QueryRequest) -> Result<RankedResult> {
        self.query_with_cancel(request, &CancellationToken::new()).await
    }

    /// Search for similar documents, abandoning the work once `cancel` fires
    pub async fn query_with_cancel(
        &self,
        request: QueryRequest,
        cancel: &CancellationToken,
    ) -> Result<RankedResult> {
        let threshold = request.threshold.unwrap_or(self.defaults.threshold);
        let top_k = request.top_k.unwrap_or(self.defaults.top_k);

        if threshold.is_nan() {
            return Err(VecSearchError::invalid_input("Similarity threshold is NaN"));
        }
        if cancel.is_cancelled() {
            return Err(VecSearchError::Cancelled);
        }

        let query_vector = match request.input {
            QueryInput::Text(text) => {
                if text.trim().is_empty() {
                    return Err(VecSearchError::invalid_input("Query cannot be empty"));
                }
                debug!(
                    "Searching - Query length: {}, threshold={}, top_k={}",
                    text.len(),
                    threshold,
                    top_k
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(VecSearchError::Cancelled),
                    embedded = self.embed(&text) => embedded?,
                }
            }
            QueryInput::Vector(vector) => {
                debug!(
                    "Searching - Query vector dimension: {}, threshold={}, top_k={}",
                    vector.dimension(),
                    threshold,
                    top_k
                );
                vector
            }
        };

        let snapshot = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(VecSearchError::Cancelled),
            records = self.corpus.all_records() => records?,
        };
        let total_candidates = snapshot.len();

        // Scoring is CPU-bound; keep it off the async workers
        let ranking = self.ranking;
        let token = cancel.clone();
        let result = tokio::task::spawn_blocking(move || {
            ranking.rank_with_cancel(&query_vector, &snapshot, threshold, top_k, &token)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Ranking task failed: {}", e))??;

        info!(
            "Search completed - {} results (from {} candidates)",
            result.len(),
            total_candidates
        );
        Ok(result)
    }

    /// Number of records in the current corpus snapshot
    pub async fn stats(&self) -> Result<usize> {
        Ok(self.corpus.all_records().await?.len())
    }

    /// Call the provider once, bounded by the embedding timeout
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let values = tokio::time::timeout(self.embedding_timeout, self.provider.embed(text))
            .await
            .map_err(|_| {
                VecSearchError::embedding_unavailable(format!(
                    "Embedding provider timed out after {:?}",
                    self.embedding_timeout
                ))
            })??;

        EmbeddingVector::from_provider(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vecsearch_common::{ErrorKind, MismatchPolicy};

    /// Provider answering from a fixed text -> vector table
    #[derive(Default)]
    struct TableProvider {
        table: HashMap<String, Vec<f32>>,
        calls: AtomicUsize,
    }

    impl TableProvider {
        fn with(entries: &[(&str, &[f32])]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(text, values)| (text.to_string(), values.to_vec()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for TableProvider {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.table
                .get(text)
                .cloned()
                .ok_or_else(|| VecSearchError::embedding_unavailable(format!("no vector for {}", text)))
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl EmbeddingProvider for SlowProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![1.0, 0.0])
        }
    }

    struct EmptyProvider;

    #[async_trait]
    impl EmbeddingProvider for EmptyProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(Vec::new())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn list_all(&self) -> Result<Vec<DocumentRecord>> {
            Err(VecSearchError::persistence("store offline"))
        }

        async fn append(&self, _record: DocumentRecord) -> Result<()> {
            Err(VecSearchError::persistence("store offline"))
        }
    }

    /// Store that fires a cancellation token while handing out its snapshot
    struct CancellingStore {
        inner: MemoryDocumentStore,
        token: CancellationToken,
    }

    #[async_trait]
    impl DocumentStore for CancellingStore {
        async fn list_all(&self) -> Result<Vec<DocumentRecord>> {
            let records = self.inner.list_all().await?;
            self.token.cancel();
            Ok(records)
        }

        async fn append(&self, record: DocumentRecord) -> Result<()> {
            self.inner.append(record).await
        }
    }

    fn engine_with(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> VectorSearchEngine {
        VectorSearchEngine::new(
            provider,
            CorpusAccessor::new(store, Duration::from_secs(5)),
            SearchDefaults::default(),
            Duration::from_millis(100),
        )
    }

    fn sample_store() -> MemoryDocumentStore {
        let v = |values: &[f32]| EmbeddingVector::new(values.to_vec()).unwrap();
        MemoryDocumentStore::with_records(vec![
            DocumentRecord::with_id("A", "cats are great", v(&[1.0, 0.0])),
            DocumentRecord::with_id("B", "dogs are great", v(&[0.9, 0.1])),
            DocumentRecord::with_id("C", "stock market news", v(&[0.0, 1.0])),
        ])
    }

    #[tokio::test]
    async fn test_ingest_stores_provider_vector() {
        let provider = Arc::new(TableProvider::with(&[("hello world", &[0.2, 0.4, 0.4])]));
        let store = Arc::new(MemoryDocumentStore::new());
        let engine = engine_with(provider, store.clone());

        let record = engine.ingest("hello world").await.unwrap();

        assert_eq!(record.content(), "hello world");
        assert_eq!(record.embedding().as_slice(), &[0.2, 0.4, 0.4]);
        assert!(!record.id().is_empty());

        let stored = store.list_all().await.unwrap();
        assert_eq!(stored, vec![record.clone()]);
        assert_eq!(engine.stats().await.unwrap(), 1);

        let again = engine.ingest("hello world").await.unwrap();
        assert_ne!(again.id(), record.id());
    }

    #[tokio::test]
    async fn test_ingest_rejects_blank_content_without_calling_provider() {
        let provider = Arc::new(TableProvider::default());
        let engine = engine_with(provider.clone(), Arc::new(MemoryDocumentStore::new()));

        let err = engine.ingest("   ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ingest_malformed_embedding() {
        let store = Arc::new(MemoryDocumentStore::new());
        let engine = engine_with(Arc::new(EmptyProvider), store.clone());

        let err = engine.ingest("hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmbeddingMalformed);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_propagates_persistence_error() {
        let provider = Arc::new(TableProvider::with(&[("hello", &[1.0])]));
        let engine = engine_with(provider.clone(), Arc::new(FailingStore));

        let err = engine.ingest("hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ingest_provider_timeout() {
        let engine = engine_with(Arc::new(SlowProvider), Arc::new(MemoryDocumentStore::new()));
        let err = engine.ingest("hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmbeddingUnavailable);
    }

    #[tokio::test]
    async fn test_ingest_batch_in_order() {
        let provider = Arc::new(TableProvider::with(&[("one", &[1.0, 0.0]), ("two", &[0.0, 1.0])]));
        let store = Arc::new(MemoryDocumentStore::new());
        let engine = engine_with(provider, store.clone());

        let records = engine.ingest_batch(&["one", "two"]).await.unwrap();
        let contents: Vec<&str> = records.iter().map(|r| r.content()).collect();
        assert_eq!(contents, vec!["one", "two"]);
        assert_eq!(store.list_all().await.unwrap(), records);

        let empty: [&str; 0] = [];
        assert!(engine.ingest_batch(&empty).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_batch_stops_at_first_failure() {
        let provider = Arc::new(TableProvider::with(&[("one", &[1.0]), ("three", &[1.0])]));
        let store = Arc::new(MemoryDocumentStore::new());
        let engine = engine_with(provider.clone(), store.clone());

        let err = engine
            .ingest_batch(&["one".to_string(), "two".to_string(), "three".to_string()])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::EmbeddingUnavailable);
        let stored = store.list_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content(), "one");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_query_by_text_scenario() {
        let provider = Arc::new(TableProvider::with(&[("kittens", &[1.0, 0.0])]));
        let engine = engine_with(provider, Arc::new(sample_store()));

        let result = engine.query(QueryRequest::text("kittens")).await.unwrap();

        let ids: Vec<&str> = result.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(result.hits[0].score, 1.0);
        assert!((result.hits[1].score - 0.994).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_query_by_vector_skips_provider() {
        let provider = Arc::new(TableProvider::default());
        let engine = engine_with(provider.clone(), Arc::new(sample_store()));

        let request = QueryRequest::vector(EmbeddingVector::new(vec![0.0, 1.0]).unwrap());
        let result = engine.query(request).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.hits[0].id, "C");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_overrides_defaults() {
        let engine = engine_with(Arc::new(TableProvider::default()), Arc::new(sample_store()));
        let query = || QueryRequest::vector(EmbeddingVector::new(vec![1.0, 0.0]).unwrap());

        let result = engine.query(query().with_threshold(-1.0)).await.unwrap();
        assert_eq!(result.len(), 3);

        let result = engine.query(query().with_top_k(1)).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.hits[0].id, "A");
    }

    #[tokio::test]
    async fn test_query_empty_corpus_is_not_an_error() {
        let provider = Arc::new(TableProvider::with(&[("anything", &[1.0, 0.0])]));
        let engine = engine_with(provider, Arc::new(MemoryDocumentStore::new()));

        let result = engine.query(QueryRequest::text("anything")).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_query_is_idempotent() {
        let provider = Arc::new(TableProvider::with(&[("pets", &[0.8, 0.2])]));
        let engine = engine_with(provider, Arc::new(sample_store()));

        let first = engine.query(QueryRequest::text("pets")).await.unwrap();
        let second = engine.query(QueryRequest::text("pets")).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_query_provider_timeout_is_unavailable() {
        let engine = engine_with(Arc::new(SlowProvider), Arc::new(sample_store()));
        let err = engine.query(QueryRequest::text("cats")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmbeddingUnavailable);
    }

    #[tokio::test]
    async fn test_query_store_failure_is_persistence_error() {
        let engine = engine_with(Arc::new(TableProvider::default()), Arc::new(FailingStore));
        let request = QueryRequest::vector(EmbeddingVector::new(vec![1.0]).unwrap());
        let err = engine.query(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }

    #[tokio::test]
    async fn test_query_rejects_blank_text() {
        let engine = engine_with(Arc::new(TableProvider::default()), Arc::new(sample_store()));
        let err = engine.query(QueryRequest::text("")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch_policies() {
        let store = || {
            Arc::new(MemoryDocumentStore::with_records(vec![
                DocumentRecord::with_id("A", "ok", EmbeddingVector::new(vec![1.0, 0.0]).unwrap()),
                DocumentRecord::with_id("X", "bad", EmbeddingVector::new(vec![1.0]).unwrap()),
            ]))
        };
        let request = || QueryRequest::vector(EmbeddingVector::new(vec![1.0, 0.0]).unwrap());

        let lenient = engine_with(Arc::new(TableProvider::default()), store());
        let result = lenient.query(request()).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.skipped, vec!["X".to_string()]);

        let strict = VectorSearchEngine::new(
            Arc::new(TableProvider::default()),
            CorpusAccessor::new(store(), Duration::from_secs(5)),
            SearchDefaults {
                mismatch_policy: MismatchPolicy::Abort,
                ..SearchDefaults::default()
            },
            Duration::from_millis(100),
        );
        let err = strict.query(request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    }

    #[tokio::test]
    async fn test_query_cancelled_before_start() {
        let provider = Arc::new(TableProvider::with(&[("cats", &[1.0, 0.0])]));
        let engine = engine_with(provider.clone(), Arc::new(sample_store()));
        let token = CancellationToken::new();
        token.cancel();

        let err = engine
            .query_with_cancel(QueryRequest::text("cats"), &token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_cancelled_while_embedding() {
        let engine = VectorSearchEngine::new(
            Arc::new(SlowProvider),
            CorpusAccessor::new(Arc::new(sample_store()), Duration::from_secs(5)),
            SearchDefaults::default(),
            Duration::from_secs(60),
        );
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = engine
            .query_with_cancel(QueryRequest::text("cats"), &token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_query_cancelled_before_scan_returns_no_hits() {
        let token = CancellationToken::new();
        let store = Arc::new(CancellingStore {
            inner: sample_store(),
            token: token.clone(),
        });
        let engine = engine_with(Arc::new(TableProvider::default()), store);

        let request = QueryRequest::vector(EmbeddingVector::new(vec![1.0, 0.0]).unwrap());
        let err = engine.query_with_cancel(request, &token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_from_config_uses_configured_defaults() {
        let config = AppConfig {
            similarity_threshold: 0.95,
            top_k: 2,
            ..AppConfig::default()
        };
        let engine = VectorSearchEngine::from_config(
            &config,
            Arc::new(TableProvider::default()),
            Arc::new(sample_store()),
        );
        assert_eq!(engine.defaults().threshold, 0.95);

        let request = QueryRequest::vector(EmbeddingVector::new(vec![1.0, 0.0]).unwrap());
        let result = engine.query(request).await.unwrap();
        let ids: Vec<&str> = result.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["A"]);
    }
}
