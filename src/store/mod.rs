//! Remote document store abstraction.
//!
//! This module defines the interface every per-user document store must
//! implement, the shared error type, and a factory that builds a store from
//! configuration.
//!
//! Writes are addressed per item and guarded by the item's base version: a
//! `put_*` with `base_version: None` creates the item and fails if it already
//! exists; `Some(v)` updates it and fails unless the stored item is at `v`.
//! Every accepted write increases the document `revision` and notifies
//! subscribers with the full document.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::watch;

use crate::config::StoreConfig;
use crate::model::{ChecklistDocument, ItemKind, Task, TaskList, UserId};

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Common error types for store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("No document for user {0}")]
    NotFound(UserId),

    #[error("Document already exists for user {0}")]
    AlreadyExists(UserId),

    #[error("Version conflict on {kind} '{id}': expected {expected:?}, found {found:?}")]
    Conflict {
        kind: ItemKind,
        id: String,
        expected: Option<u64>,
        found: Option<u64>,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Interface to the per-user document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the store type identifier (e.g., "memory", "file").
    fn store_type(&self) -> &str;

    // Whole-document operations
    async fn create_document(&self, user: &UserId) -> Result<(), StoreError>;
    async fn fetch_document(&self, user: &UserId) -> Result<ChecklistDocument, StoreError>;
    /// Overwrite the whole document, last write wins. Returns the new revision.
    async fn replace_document(&self, user: &UserId, doc: ChecklistDocument) -> Result<u64, StoreError>;
    async fn delete_document(&self, user: &UserId) -> Result<(), StoreError>;

    // Versioned per-item writes; each returns the new document revision
    async fn put_task(&self, user: &UserId, task: &Task, base_version: Option<u64>) -> Result<u64, StoreError>;
    async fn delete_task(&self, user: &UserId, task_id: &str, base_version: u64) -> Result<u64, StoreError>;
    async fn put_list(&self, user: &UserId, list: &TaskList, base_version: Option<u64>) -> Result<u64, StoreError>;
    async fn delete_list(&self, user: &UserId, list_id: &str, base_version: u64) -> Result<u64, StoreError>;

    /// Subscribe to the user's document. The receiver always holds the latest
    /// full document.
    async fn subscribe(&self, user: &UserId) -> Result<watch::Receiver<ChecklistDocument>, StoreError>;
}

/// Create a store instance from configuration.
///
/// # Errors
/// Returns error if the backend name is unknown or the data directory cannot
/// be resolved or created.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "file" => {
            let dir = resolve_data_dir(config)?;
            Ok(Arc::new(FileStore::open(dir).await?))
        }
        other => Err(anyhow!("Unknown store backend: {}", other)),
    }
}

fn resolve_data_dir(config: &StoreConfig) -> Result<PathBuf> {
    if !config.data_dir.is_empty() {
        return Ok(PathBuf::from(&config.data_dir));
    }
    dirs::data_local_dir()
        .map(|dir| dir.join("checklist").join("documents"))
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}
