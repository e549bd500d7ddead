//! In-process document store.

use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use tokio::sync::{watch, Mutex};

use super::{DocumentStore, StoreError};
use crate::model::{ChecklistDocument, ItemKind, Task, TaskList, UserId};

/// Document store kept entirely in memory.
///
/// Each user's document lives inside a `watch` channel, so the channel is both
/// the storage and the change feed.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<UserId, watch::Sender<ChecklistDocument>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a document as-is, keeping its revision.
    pub async fn load_document(&self, user: &UserId, doc: ChecklistDocument) {
        let mut documents = self.documents.lock().await;
        match documents.get(user) {
            Some(sender) => {
                sender.send_replace(doc);
            }
            None => {
                let (sender, _) = watch::channel(doc);
                documents.insert(user.clone(), sender);
            }
        }
    }

    pub async fn contains(&self, user: &UserId) -> bool {
        self.documents.lock().await.contains_key(user)
    }

    /// Run an edit against a user's document. When the edit succeeds the
    /// revision is bumped and subscribers are notified; a failed edit must
    /// leave the document untouched.
    async fn edit<F>(&self, user: &UserId, edit: F) -> Result<u64, StoreError>
    where
        F: FnOnce(&mut ChecklistDocument) -> Result<(), StoreError> + Send,
    {
        let documents = self.documents.lock().await;
        let sender = documents.get(user).ok_or_else(|| StoreError::NotFound(user.clone()))?;

        let mut result = Ok(0);
        sender.send_if_modified(|doc| match edit(doc) {
            Ok(()) => {
                doc.revision += 1;
                result = Ok(doc.revision);
                true
            }
            Err(e) => {
                result = Err(e);
                false
            }
        });
        result
    }
}

fn check_version(kind: ItemKind, id: &str, found: Option<u64>, expected: Option<u64>) -> Result<(), StoreError> {
    if found != expected {
        return Err(StoreError::Conflict {
            kind,
            id: id.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

// Edits shared by every store. Each either applies fully or returns an
// error with the document untouched; the caller bumps the revision.

pub(super) fn replace_contents(current: &mut ChecklistDocument, doc: ChecklistDocument) -> Result<(), StoreError> {
    let revision = current.revision;
    *current = doc;
    current.revision = revision;
    Ok(())
}

pub(super) fn put_task(doc: &mut ChecklistDocument, task: &Task, base_version: Option<u64>) -> Result<(), StoreError> {
    let found = doc.task(&task.id).map(|t| t.version);
    check_version(ItemKind::Task, &task.id, found, base_version)?;
    match doc.task_mut(&task.id) {
        Some(slot) => *slot = task.clone(),
        None => doc.tasks.push(task.clone()),
    }
    Ok(())
}

pub(super) fn delete_task(doc: &mut ChecklistDocument, task_id: &str, base_version: u64) -> Result<(), StoreError> {
    let found = doc.task(task_id).map(|t| t.version);
    check_version(ItemKind::Task, task_id, found, Some(base_version))?;
    doc.tasks.retain(|t| t.id != task_id);
    Ok(())
}

pub(super) fn put_list(doc: &mut ChecklistDocument, list: &TaskList, base_version: Option<u64>) -> Result<(), StoreError> {
    let found = doc.list(&list.id).map(|l| l.version);
    check_version(ItemKind::List, &list.id, found, base_version)?;
    match doc.list_mut(&list.id) {
        Some(slot) => *slot = list.clone(),
        None => doc.lists.push(list.clone()),
    }
    Ok(())
}

pub(super) fn delete_list(doc: &mut ChecklistDocument, list_id: &str, base_version: u64) -> Result<(), StoreError> {
    let found = doc.list(list_id).map(|l| l.version);
    check_version(ItemKind::List, list_id, found, Some(base_version))?;
    doc.lists.retain(|l| l.id != list_id);
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    async fn create_document(&self, user: &UserId) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().await;
        if documents.contains_key(user) {
            return Err(StoreError::AlreadyExists(user.clone()));
        }
        let (sender, _) = watch::channel(ChecklistDocument::default());
        documents.insert(user.clone(), sender);
        debug!("Created document for user {}", user);
        Ok(())
    }

    async fn fetch_document(&self, user: &UserId) -> Result<ChecklistDocument, StoreError> {
        let documents = self.documents.lock().await;
        documents
            .get(user)
            .map(|sender| sender.borrow().clone())
            .ok_or_else(|| StoreError::NotFound(user.clone()))
    }

    async fn replace_document(&self, user: &UserId, doc: ChecklistDocument) -> Result<u64, StoreError> {
        self.edit(user, |current| replace_contents(current, doc)).await
    }

    async fn delete_document(&self, user: &UserId) -> Result<(), StoreError> {
        self.documents
            .lock()
            .await
            .remove(user)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(user.clone()))
    }

    async fn put_task(&self, user: &UserId, task: &Task, base_version: Option<u64>) -> Result<u64, StoreError> {
        self.edit(user, |doc| put_task(doc, task, base_version)).await
    }

    async fn delete_task(&self, user: &UserId, task_id: &str, base_version: u64) -> Result<u64, StoreError> {
        self.edit(user, |doc| delete_task(doc, task_id, base_version)).await
    }

    async fn put_list(&self, user: &UserId, list: &TaskList, base_version: Option<u64>) -> Result<u64, StoreError> {
        self.edit(user, |doc| put_list(doc, list, base_version)).await
    }

    async fn delete_list(&self, user: &UserId, list_id: &str, base_version: u64) -> Result<u64, StoreError> {
        self.edit(user, |doc| delete_list(doc, list_id, base_version)).await
    }

    async fn subscribe(&self, user: &UserId) -> Result<watch::Receiver<ChecklistDocument>, StoreError> {
        let documents = self.documents.lock().await;
        documents
            .get(user)
            .map(|sender| sender.subscribe())
            .ok_or_else(|| StoreError::NotFound(user.clone()))
    }
}
