//! Whole-collection log storage.
//!
//! This module provides:
//! - [`LogStore`] - Async trait over storage backends
//! - [`JsonFileStore`] - The collection as one pretty-printed JSON document
//! - [`MemoryLogStore`] - In-memory backend with the same contract
//!
//! Both backends work on whole snapshots: `append` reads the full collection,
//! pushes one record and writes the full collection back. No lock spans that
//! read-modify-write, so two concurrent appends can race and the later write
//! wins, dropping the other record. Readers always see a complete snapshot.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::types::{LogCollection, LogRecord};

/// Shared handle to a store backend.
pub type SharedLogStore = Arc<dyn LogStore>;

/// Trait for log storage backends.
#[async_trait]
pub trait LogStore: Send + Sync + fmt::Debug {
    /// Prepares the backing medium. Called once at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be created.
    async fn initialize(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Appends a record and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or rewritten.
    async fn append(&self, record: LogRecord) -> StoreResult<LogRecord>;

    /// Reads every stored record in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or is corrupt.
    async fn read_all(&self) -> StoreResult<Vec<LogRecord>>;
}

/// Stores the collection as a single `{ "logs": [...] }` JSON file.
///
/// Every write goes to a uniquely named temporary sibling which is synced and
/// then renamed over the target, so a reader never observes a torn file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the given file. Nothing is touched until
    /// [`LogStore::initialize`] or the first operation.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_collection(&self) -> StoreResult<LogCollection> {
        let data = fs::read(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        serde_json::from_slice(&data).map_err(|e| StoreError::corrupt(&self.path, e))
    }

    async fn write_collection(&self, collection: &LogCollection) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(collection)?;
        let temp_path = self.temp_path();

        if let Err(e) = Self::write_synced(&temp_path, &data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        // Atomic rename
        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::io(&self.path, e));
        }

        debug!(path = %self.path.display(), records = collection.logs.len(), "Wrote log collection");
        Ok(())
    }

    async fn write_synced(path: &Path, data: &[u8]) -> StoreResult<()> {
        let mut file = fs::File::create(path)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        file.write_all(data)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        file.sync_all().await.map_err(|e| StoreError::io(path, e))
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "logs.json".into(), |n| n.to_string_lossy());
        self.path
            .with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl LogStore for JsonFileStore {
    async fn initialize(&self) -> StoreResult<()> {
        let exists = fs::try_exists(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        if exists {
            debug!(path = %self.path.display(), "Log collection already present");
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }
        self.write_collection(&LogCollection::default()).await?;
        info!(path = %self.path.display(), "Initialized empty log collection");
        Ok(())
    }

    async fn append(&self, record: LogRecord) -> StoreResult<LogRecord> {
        let mut collection = self.read_collection().await.inspect_err(|e| {
            warn!(error = %e, "Failed to read log collection");
        })?;
        collection.logs.push(record.clone());
        self.write_collection(&collection).await.inspect_err(|e| {
            warn!(error = %e, "Failed to persist log collection");
        })?;
        Ok(record)
    }

    async fn read_all(&self) -> StoreResult<Vec<LogRecord>> {
        let collection = self.read_collection().await.inspect_err(|e| {
            warn!(error = %e, "Failed to read log collection");
        })?;
        Ok(collection.logs)
    }
}

/// In-memory backend, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    records: RwLock<Vec<LogRecord>>,
}

impl MemoryLogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with records.
    #[must_use]
    pub fn with_records(records: Vec<LogRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn append(&self, record: LogRecord) -> StoreResult<LogRecord> {
        self.records.write().push(record.clone());
        Ok(record)
    }

    async fn read_all(&self) -> StoreResult<Vec<LogRecord>> {
        Ok(self.records.read().clone())
    }
}
