//! Dataset Store
//!
//! Owns all ingested datasets and is the only component that mutates them.
//! Readers take a snapshot: an `Arc` to an immutable map that is atomically
//! swapped on every add/remove, so a query either sees a dataset complete
//! and consistent or not at all.
//!
//! Every accepted dataset is flushed to disk as one JSON file before it
//! becomes visible, and reloaded on startup.

use crate::dataset::dataset::{is_valid_dataset_id, Dataset};
use crate::dataset::fields::DatasetKind;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors from dataset store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Identifier is empty, whitespace-only, or contains the separator
    #[error("Invalid dataset id: {0:?}")]
    InvalidId(String),

    /// A dataset with this id already exists
    #[error("Dataset already exists: {0}")]
    AlreadyExists(String),

    /// No dataset with this id
    #[error("Dataset not found: {0}")]
    NotFound(String),

    /// Filesystem error during persistence
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset file could not be serialized/deserialized
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A consistent, read-only view of all datasets at one point in time
pub type Snapshot = Arc<HashMap<String, Arc<Dataset>>>;

/// Summary of one stored dataset, as listed over the wire
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub id: String,
    pub kind: DatasetKind,
    #[serde(rename = "numRows")]
    pub num_rows: usize,
}

/// Registry of ingested datasets with flush-on-write persistence
pub struct DatasetStore {
    data_dir: PathBuf,
    datasets: RwLock<Snapshot>,
}

impl DatasetStore {
    /// Open a store rooted at `data_dir`, reloading every persisted dataset.
    /// Corrupt files are skipped with a warning rather than failing startup.
    pub async fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir).await?;

        let mut datasets = HashMap::new();
        let mut dir = tokio::fs::read_dir(&data_dir).await?;
        while let Some(file) = dir.next_entry().await? {
            let path = file.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::load_file(&path).await {
                Ok(dataset) => {
                    tracing::info!(
                        id = %dataset.id(),
                        kind = %dataset.kind(),
                        rows = dataset.len(),
                        "Loaded dataset from disk"
                    );
                    datasets.insert(dataset.id().to_string(), Arc::new(dataset));
                }
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Skipping unreadable dataset file");
                }
            }
        }

        Ok(Self {
            data_dir,
            datasets: RwLock::new(Arc::new(datasets)),
        })
    }

    async fn load_file(path: &PathBuf) -> StoreResult<Dataset> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Add a dataset: validate the id, reject duplicates, flush the whole
    /// dataset to disk, then publish it. Returns the ids of all stored
    /// datasets (the new one included).
    pub async fn add(&self, dataset: Dataset) -> StoreResult<Vec<String>> {
        let id = dataset.id().to_string();
        if !is_valid_dataset_id(&id) {
            return Err(StoreError::InvalidId(id));
        }
        let json = serde_json::to_string(&dataset)?;

        // Flush before publish, both under the write lock: a losing
        // duplicate add must not touch the winner's file.
        let mut guard = self.datasets.write().await;
        if guard.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        tokio::fs::write(self.dataset_path(&id), json).await?;

        let mut next: HashMap<String, Arc<Dataset>> = (**guard).clone();
        let rows = dataset.len();
        next.insert(id.clone(), Arc::new(dataset));
        *guard = Arc::new(next);
        let ids: Vec<String> = guard.keys().cloned().collect();
        drop(guard);

        tracing::info!(id = %id, rows, "Dataset added");
        Ok(ids)
    }

    /// Remove a dataset and its persisted file. Returns the removed id;
    /// an unknown id is `NotFound`, distinct from an invalid id.
    pub async fn remove(&self, id: &str) -> StoreResult<String> {
        if !is_valid_dataset_id(id) {
            return Err(StoreError::InvalidId(id.to_string()));
        }

        let mut guard = self.datasets.write().await;
        if !guard.contains_key(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let mut next: HashMap<String, Arc<Dataset>> = (**guard).clone();
        next.remove(id);
        *guard = Arc::new(next);
        drop(guard);

        match tokio::fs::remove_file(self.dataset_path(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        tracing::info!(id = %id, "Dataset removed");
        Ok(id.to_string())
    }

    /// Summaries of all stored datasets
    pub async fn list(&self) -> Vec<DatasetSummary> {
        let snapshot = self.snapshot().await;
        let mut out: Vec<DatasetSummary> = snapshot
            .values()
            .map(|d| DatasetSummary {
                id: d.id().to_string(),
                kind: d.kind(),
                num_rows: d.len(),
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Take a consistent read-only snapshot of all datasets
    pub async fn snapshot(&self) -> Snapshot {
        Arc::clone(&*self.datasets.read().await)
    }

    fn dataset_path(&self, id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", id))
    }
}
