use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use vecsearch_common::{Result, VecSearchError};

use crate::store::DocumentStore;
use crate::types::DocumentRecord;

/// Timeout-bounded access to the document store
///
/// Owns no similarity logic. Swapping the store for an indexed backend does
/// not change what the ranking engine sees: a plain snapshot of records.
#[derive(Clone)]
pub struct CorpusAccessor {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl CorpusAccessor {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Snapshot of every stored record at call time
    pub async fn all_records(&self) -> Result<Vec<DocumentRecord>> {
        self.bounded("list", self.store.list_all()).await
    }

    pub async fn append(&self, record: DocumentRecord) -> Result<()> {
        self.bounded("append", self.store.append(record)).await
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| {
                VecSearchError::persistence(format!(
                    "Document store {} timed out after {:?}",
                    operation, self.timeout
                ))
            })?
    }
}

impl std::fmt::Debug for CorpusAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusAccessor")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
