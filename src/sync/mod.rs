//! Synchronization service module for the checklist application.
//!
//! This module provides the [`SyncService`] struct which keeps a local mirror
//! of one user's checklist document in step with the remote document store.
//!
//! The sync service acts as the main data layer for the application, offering:
//! - Fast local snapshots of the mirror for rendering views
//! - A background listener that replaces the mirror whenever the remote
//!   document changes
//! - Lifecycle mutations written back as per-item versioned updates

pub mod plan;

use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::lifecycle::{Lifecycle, LifecycleError, Mutation, Outcome};
use crate::model::{ChecklistDocument, UserId};
use crate::store::{DocumentStore, StoreError};

pub use plan::{plan_writes, ItemWrite};

/// Errors returned by [`SyncService::apply`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Whether the store rejected a write because the item moved on remotely.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SyncError::Store(StoreError::Conflict { .. }))
    }
}

/// Represents the current status of the last write-back.
///
/// This enum is used to communicate the state of sync operations to the UI,
/// allowing for proper status indicators and error handling.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// Nothing has been written yet
    #[default]
    Idle,
    /// A write-back is currently in progress
    InProgress,
    /// The last write-back completed successfully
    Success,
    /// The last write-back failed with an error
    Error {
        /// Human-readable error message describing what went wrong
        message: String,
    },
}

/// Aborts the listener task once the last service handle is gone.
struct Listener(JoinHandle<()>);

impl Drop for Listener {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Service that mirrors one user's document and writes mutations back.
///
/// The mirror only moves forward in store revision order: a notification
/// older than the mirror is ignored, so a slow listener can never undo a
/// write that already landed. Local mutations are serialized, each one
/// planned against the mirror as it stands after the previous one.
///
/// # Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use checklist::lifecycle::{Lifecycle, Mutation};
/// use checklist::model::{Task, UserId};
/// use checklist::store::{DocumentStore, MemoryStore};
/// use checklist::sync::SyncService;
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = Arc::new(MemoryStore::new());
/// let user = UserId::from("alice");
/// store.create_document(&user).await?;
///
/// let sync = SyncService::connect(store, user, Lifecycle::default()).await?;
/// sync.apply(Mutation::AddTask(Task::new("Water the plants"))).await?;
/// assert_eq!(sync.snapshot().tasks.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SyncService {
    store: Arc<dyn DocumentStore>,
    user_id: UserId,
    lifecycle: Lifecycle,
    mirror: Arc<watch::Sender<ChecklistDocument>>,
    write_lock: Arc<Mutex<()>>,
    status: Arc<Mutex<SyncStatus>>,
    listener: Arc<Listener>,
}

impl SyncService {
    /// Fetch the user's document and start following remote changes.
    ///
    /// # Errors
    /// Returns the store error if the document cannot be fetched or
    /// subscribed to (e.g. `StoreError::NotFound` for an unknown user).
    pub async fn connect(store: Arc<dyn DocumentStore>, user_id: UserId, lifecycle: Lifecycle) -> Result<Self, StoreError> {
        info!("🔄 Connecting to {} store for user {}", store.store_type(), user_id);

        let initial = store.fetch_document(&user_id).await?;
        let mut remote = store.subscribe(&user_id).await?;
        info!(
            "✅ Loaded {} tasks and {} lists at revision {}",
            initial.tasks.len(),
            initial.lists.len(),
            initial.revision
        );

        let (mirror, _) = watch::channel(initial);
        let mirror = Arc::new(mirror);

        let listener_mirror = Arc::clone(&mirror);
        let listener_user = user_id.clone();
        let handle = tokio::spawn(async move {
            while remote.changed().await.is_ok() {
                let doc = remote.borrow_and_update().clone();
                let revision = doc.revision;
                if accept_remote(&listener_mirror, doc) {
                    debug!("Mirror for {} replaced at revision {}", listener_user, revision);
                }
            }
            debug!("Remote document for {} closed, listener stopped", listener_user);
        });

        Ok(Self {
            store,
            user_id,
            lifecycle,
            mirror,
            write_lock: Arc::new(Mutex::new(())),
            status: Arc::new(Mutex::new(SyncStatus::Idle)),
            listener: Arc::new(Listener(handle)),
        })
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Current contents of the mirror.
    pub fn snapshot(&self) -> ChecklistDocument {
        self.mirror.borrow().clone()
    }

    /// Watch the mirror; the receiver is notified whenever it is replaced.
    pub fn subscribe(&self) -> watch::Receiver<ChecklistDocument> {
        self.mirror.subscribe()
    }

    pub async fn status(&self) -> SyncStatus {
        self.status.lock().await.clone()
    }

    /// Apply a lifecycle mutation and write the affected items back.
    ///
    /// The mutation is computed on a copy of the mirror. Nothing touches the
    /// mirror until every write has been accepted; on failure the mirror
    /// keeps its last-known state and the status records the error. A
    /// version conflict additionally reloads the remote document.
    ///
    /// # Returns
    /// The lifecycle outcome, e.g. `Outcome::NotFound` for a stale id or
    /// `Outcome::Completed` when the change should be celebrated.
    pub async fn apply(&self, mutation: Mutation) -> Result<Outcome, SyncError> {
        let _guard = self.write_lock.lock().await;

        let before = self.snapshot();
        let mut after = before.clone();
        let now = Utc::now();
        let outcome = self.lifecycle.apply(&mut after, mutation, now)?;
        if !outcome.is_change() {
            return Ok(outcome);
        }

        let writes = plan_writes(&before, &mut after, now);
        if writes.is_empty() {
            return Ok(outcome);
        }

        self.set_status(SyncStatus::InProgress).await;
        let mut revision = before.revision;
        for write in &writes {
            match self.write(write).await {
                Ok(new_revision) => revision = new_revision,
                Err(e) => return Err(self.fail(e).await),
            }
        }

        after.revision = revision;
        commit_local(&self.mirror, after);
        self.set_status(SyncStatus::Success).await;
        debug!("Wrote {} item(s) for {}, now at revision {}", writes.len(), self.user_id, revision);
        Ok(outcome)
    }

    /// Fetch the remote document and replace the mirror with it.
    pub async fn reload(&self) -> Result<(), StoreError> {
        let doc = self.store.fetch_document(&self.user_id).await?;
        info!("🔄 Reloaded document for {} at revision {}", self.user_id, doc.revision);
        accept_remote(&self.mirror, doc);
        Ok(())
    }

    /// Stop following remote changes.
    pub fn shutdown(&self) {
        self.listener.0.abort();
        info!("Sync for {} stopped", self.user_id);
    }

    async fn write(&self, write: &ItemWrite) -> Result<u64, StoreError> {
        let user = &self.user_id;
        match write {
            ItemWrite::PutTask { task, base_version } => self.store.put_task(user, task, *base_version).await,
            ItemWrite::DeleteTask { id, base_version } => self.store.delete_task(user, id, *base_version).await,
            ItemWrite::PutList { list, base_version } => self.store.put_list(user, list, *base_version).await,
            ItemWrite::DeleteList { id, base_version } => self.store.delete_list(user, id, *base_version).await,
        }
    }

    async fn fail(&self, e: StoreError) -> SyncError {
        if matches!(e, StoreError::Conflict { .. }) {
            warn!("⚠️  {}; reloading remote document", e);
            if let Err(reload_error) = self.reload().await {
                error!("❌ Failed to reload after conflict: {}", reload_error);
            }
        } else {
            error!("❌ Failed to write changes for {}: {}", self.user_id, e);
        }
        self.set_status(SyncStatus::Error { message: e.to_string() }).await;
        SyncError::Store(e)
    }

    async fn set_status(&self, status: SyncStatus) {
        *self.status.lock().await = status;
    }
}

/// Take a remote document unless the mirror is already past it.
///
/// An equal revision still replaces a differing mirror: the remote copy is
/// authoritative for a revision the mirror only approximated locally.
fn accept_remote(mirror: &watch::Sender<ChecklistDocument>, doc: ChecklistDocument) -> bool {
    mirror.send_if_modified(|current| {
        if doc.revision < current.revision || doc == *current {
            return false;
        }
        *current = doc;
        true
    })
}

/// Take a locally computed document only if nothing newer arrived meanwhile.
fn commit_local(mirror: &watch::Sender<ChecklistDocument>, doc: ChecklistDocument) -> bool {
    mirror.send_if_modified(|current| {
        if doc.revision <= current.revision {
            return false;
        }
        *current = doc;
        true
    })
}
