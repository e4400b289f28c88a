//! Document store backends
//!
//! A store keeps records in insertion order, which is the corpus's natural
//! iteration order for ranking tie-breaks. Records are never updated or
//! deleted through this interface.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};
use vecsearch_common::{Result, VecSearchError};

use crate::types::DocumentRecord;

/// Durable storage of document records
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point-in-time copy of every stored record, in insertion order
    async fn list_all(&self) -> Result<Vec<DocumentRecord>>;

    /// Persist a new record; duplicate ids are rejected
    async fn append(&self, record: DocumentRecord) -> Result<()>;
}

fn duplicate_id(id: &str) -> VecSearchError {
    VecSearchError::persistence(format!("Document id already exists: {}", id))
}

/// Process-local store, mostly for tests and embedding in other services
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    records: RwLock<Vec<DocumentRecord>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<DocumentRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_all(&self) -> Result<Vec<DocumentRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn append(&self, record: DocumentRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(duplicate_id(record.id()));
        }
        records.push(record);
        Ok(())
    }
}

/// JSON array file store
///
/// The file is read once at open time; every append rewrites it through a
/// temporary file and rename, and only then updates the in-memory copy.
/// The store assumes it is the file's only writer.
#[derive(Debug)]
pub struct JsonFileStore {
    records: RwLock<Vec<DocumentRecord>>,
    file_path: PathBuf,
}

impl JsonFileStore {
    /// Open the store, creating parent directories when the file does not exist yet
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();

        let records: Vec<DocumentRecord> = if tokio::fs::try_exists(&file_path)
            .await
            .map_err(|e| persistence_io("check", &file_path, e))?
        {
            let data = tokio::fs::read_to_string(&file_path)
                .await
                .map_err(|e| persistence_io("read", &file_path, e))?;
            if data.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&data).map_err(|e| {
                    VecSearchError::persistence(format!(
                        "Corrupt document store {}: {}",
                        file_path.display(),
                        e
                    ))
                })?
            }
        } else {
            if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| persistence_io("create directory for", &file_path, e))?;
            }
            Vec::new()
        };

        info!(
            "Document store opened - {} records ({})",
            records.len(),
            file_path.display()
        );

        Ok(Self {
            records: RwLock::new(records),
            file_path,
        })
    }

    async fn save(&self, records: &[DocumentRecord]) -> Result<()> {
        let data = serde_json::to_string_pretty(records).map_err(|e| {
            VecSearchError::persistence(format!("Failed to encode document store: {}", e))
        })?;
        let temp_path = self.file_path.with_extension("json.tmp");

        tokio::fs::write(&temp_path, data)
            .await
            .map_err(|e| persistence_io("write", &temp_path, e))?;
        tokio::fs::rename(&temp_path, &self.file_path)
            .await
            .map_err(|e| persistence_io("replace", &self.file_path, e))?;

        debug!("Document store saved - {} records", records.len());
        Ok(())
    }
}

fn persistence_io(action: &str, path: &Path, e: std::io::Error) -> VecSearchError {
    VecSearchError::persistence(format!("Failed to {} {}: {}", action, path.display(), e))
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn list_all(&self) -> Result<Vec<DocumentRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn append(&self, record: DocumentRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(duplicate_id(record.id()));
        }

        let mut next = records.clone();
        next.push(record);
        self.save(&next).await?;
        *records = next;

        Ok(())
    }
}
