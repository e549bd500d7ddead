//! Document store persisted as one JSON file per user.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::{watch, Mutex};

use super::memory::{self, MemoryStore};
use super::{DocumentStore, StoreError};
use crate::model::{ChecklistDocument, Task, TaskList, UserId};

/// File-backed store.
///
/// Documents are served from an inner [`MemoryStore`] and written through to
/// `<dir>/<user>.json`. A write is published only after its file is saved.
/// Files are loaded lazily the first time a user's document is touched.
pub struct FileStore {
    dir: PathBuf,
    memory: MemoryStore,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to create {}: {e}", dir.display())))?;
        info!("📁 Opened file store at {}", dir.display());
        Ok(Self {
            dir,
            memory: MemoryStore::new(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, user: &UserId) -> Result<PathBuf, StoreError> {
        let id = user.as_str();
        let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidData(format!("User id '{id}' cannot be used as a file name")));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    /// Make sure the user's file has been read into memory.
    async fn ensure_loaded(&self, user: &UserId) -> Result<(), StoreError> {
        if self.memory.contains(user).await {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;
        self.load_if_missing(user).await
    }

    /// Read the user's file unless memory already holds the document.
    /// Callers hold `write_lock`, so a load never lands over a newer write.
    async fn load_if_missing(&self, user: &UserId) -> Result<(), StoreError> {
        if self.memory.contains(user).await {
            return Ok(());
        }
        let path = self.document_path(user)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::Unavailable(format!("Failed to read {}: {e}", path.display()))),
        };
        let doc: ChecklistDocument = serde_json::from_str(&content)
            .map_err(|e| StoreError::InvalidData(format!("Failed to parse {}: {e}", path.display())))?;
        debug!("Loaded document for user {} (revision {})", user, doc.revision);
        self.memory.load_document(user, doc).await;
        Ok(())
    }

    async fn write_file(&self, user: &UserId, doc: &ChecklistDocument) -> Result<(), StoreError> {
        let path = self.document_path(user)?;
        let content = serde_json::to_string_pretty(doc)
            .map_err(|e| StoreError::InvalidData(format!("Failed to serialize document: {e}")))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to write {}: {e}", path.display())))?;
        Ok(())
    }

    /// Apply an edit to a copy of the document and write it to disk. Memory
    /// and subscribers only see the new revision once the file is in place.
    async fn commit<F>(&self, user: &UserId, edit: F) -> Result<u64, StoreError>
    where
        F: FnOnce(&mut ChecklistDocument) -> Result<(), StoreError> + Send,
    {
        let _guard = self.write_lock.lock().await;
        self.load_if_missing(user).await?;
        let mut doc = self.memory.fetch_document(user).await?;
        edit(&mut doc)?;
        doc.revision += 1;
        self.write_file(user, &doc).await?;

        let revision = doc.revision;
        self.memory.load_document(user, doc).await;
        Ok(revision)
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    fn store_type(&self) -> &str {
        "file"
    }

    async fn create_document(&self, user: &UserId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.load_if_missing(user).await?;
        if self.memory.contains(user).await {
            return Err(StoreError::AlreadyExists(user.clone()));
        }
        let doc = ChecklistDocument::default();
        self.write_file(user, &doc).await?;
        self.memory.load_document(user, doc).await;
        debug!("Created document for user {}", user);
        Ok(())
    }

    async fn fetch_document(&self, user: &UserId) -> Result<ChecklistDocument, StoreError> {
        self.ensure_loaded(user).await?;
        self.memory.fetch_document(user).await
    }

    async fn replace_document(&self, user: &UserId, doc: ChecklistDocument) -> Result<u64, StoreError> {
        self.commit(user, |current| memory::replace_contents(current, doc)).await
    }

    async fn delete_document(&self, user: &UserId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.load_if_missing(user).await?;
        if !self.memory.contains(user).await {
            return Err(StoreError::NotFound(user.clone()));
        }
        let path = self.document_path(user)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to remove {}: {e}", path.display())))?;
        self.memory.delete_document(user).await
    }

    async fn put_task(&self, user: &UserId, task: &Task, base_version: Option<u64>) -> Result<u64, StoreError> {
        self.commit(user, |doc| memory::put_task(doc, task, base_version)).await
    }

    async fn delete_task(&self, user: &UserId, task_id: &str, base_version: u64) -> Result<u64, StoreError> {
        self.commit(user, |doc| memory::delete_task(doc, task_id, base_version)).await
    }

    async fn put_list(&self, user: &UserId, list: &TaskList, base_version: Option<u64>) -> Result<u64, StoreError> {
        self.commit(user, |doc| memory::put_list(doc, list, base_version)).await
    }

    async fn delete_list(&self, user: &UserId, list_id: &str, base_version: u64) -> Result<u64, StoreError> {
        self.commit(user, |doc| memory::delete_list(doc, list_id, base_version)).await
    }

    async fn subscribe(&self, user: &UserId) -> Result<watch::Receiver<ChecklistDocument>, StoreError> {
        self.ensure_loaded(user).await?;
        self.memory.subscribe(user).await
    }
}
