//! Item model for tasks, task lists and the per-user checklist document.
//!
//! The archive stamp (`archivedAt` + `archivedReason`) is held as a single
//! `Option<Archival>` so the two fields can never drift apart. On the wire the
//! document keeps the flat camelCase layout the remote store expects:
//!
//! ```json
//! { "id": "…", "text": "Buy milk", "completed": true,
//!   "archived": true, "archivedAt": "2025-01-01T10:00:00Z", "archivedReason": "completed" }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier of an authenticated user, as issued by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Why an item was moved out of the active view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveReason {
    Completed,
    Deleted,
}

impl fmt::Display for ArchiveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveReason::Completed => f.write_str("completed"),
            ArchiveReason::Deleted => f.write_str("deleted"),
        }
    }
}

/// Kind of item, used in log lines and error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Task,
    List,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Task => f.write_str("task"),
            ItemKind::List => f.write_str("list"),
        }
    }
}

/// A single archive stamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Archival {
    pub at: DateTime<Utc>,
    pub reason: ArchiveReason,
    /// Set when the stamp was applied by a list-level cascade rather than
    /// directly on this task.
    pub inherited: bool,
}

/// Archive status of a task or list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ArchiveFields", into = "ArchiveFields")]
pub struct ArchiveState(Option<Archival>);

impl ArchiveState {
    pub fn active() -> Self {
        Self(None)
    }

    pub fn is_archived(&self) -> bool {
        self.0.is_some()
    }

    pub fn archival(&self) -> Option<&Archival> {
        self.0.as_ref()
    }

    pub fn reason(&self) -> Option<ArchiveReason> {
        self.0.as_ref().map(|a| a.reason)
    }

    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.0.as_ref().map(|a| a.at)
    }

    pub fn is_inherited(&self) -> bool {
        self.0.as_ref().is_some_and(|a| a.inherited)
    }

    pub fn stamp(&mut self, at: DateTime<Utc>, reason: ArchiveReason) {
        self.0 = Some(Archival {
            at,
            reason,
            inherited: false,
        });
    }

    pub fn stamp_inherited(&mut self, at: DateTime<Utc>, reason: ArchiveReason) {
        self.0 = Some(Archival {
            at,
            reason,
            inherited: true,
        });
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }
}

/// Flat wire representation of [`ArchiveState`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ArchiveFields {
    archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    archived_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    archived_reason: Option<ArchiveReason>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    archived_with_list: bool,
}

impl TryFrom<ArchiveFields> for ArchiveState {
    type Error = String;

    fn try_from(fields: ArchiveFields) -> Result<Self, Self::Error> {
        match (fields.archived, fields.archived_at, fields.archived_reason) {
            (false, None, None) => Ok(Self(None)),
            (true, Some(at), Some(reason)) => Ok(Self(Some(Archival {
                at,
                reason,
                inherited: fields.archived_with_list,
            }))),
            (archived, at, reason) => Err(format!(
                "inconsistent archive fields: archived={archived}, archivedAt present={}, archivedReason present={}",
                at.is_some(),
                reason.is_some()
            )),
        }
    }
}

impl From<ArchiveState> for ArchiveFields {
    fn from(state: ArchiveState) -> Self {
        match state.0 {
            Some(archival) => ArchiveFields {
                archived: true,
                archived_at: Some(archival.at),
                archived_reason: Some(archival.reason),
                archived_with_list: archival.inherited,
            },
            None => ArchiveFields::default(),
        }
    }
}

/// A single task, either standalone or owned by a [`TaskList`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(flatten)]
    pub archive: ArchiveState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_time: Option<String>,
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create an active, incomplete task with a fresh id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            note: None,
            completed: false,
            archive: ArchiveState::active(),
            deadline: None,
            assigned_time: None,
            version: 0,
            updated_at: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn is_archived(&self) -> bool {
        self.archive.is_archived()
    }
}

/// A named, ordered group of tasks. The list exclusively owns its tasks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(flatten)]
    pub archive: ArchiveState,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskList {
    /// Create an active, incomplete, empty list with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            note: None,
            completed: false,
            archive: ArchiveState::active(),
            tasks: Vec::new(),
            version: 0,
            updated_at: None,
        }
    }

    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn is_archived(&self) -> bool {
        self.archive.is_archived()
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn completed_task_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }
}

/// The per-user document held by the remote store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistDocument {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub lists: Vec<TaskList>,
    /// Store-assigned counter, increased on every accepted write.
    #[serde(default)]
    pub revision: u64,
}

impl ChecklistDocument {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn list(&self, id: &str) -> Option<&TaskList> {
        self.lists.iter().find(|l| l.id == id)
    }

    pub fn list_mut(&mut self, id: &str) -> Option<&mut TaskList> {
        self.lists.iter_mut().find(|l| l.id == id)
    }
}
