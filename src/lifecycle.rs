//! Lifecycle transitions for tasks and lists.
//!
//! Every operation here is a pure transformation of a [`ChecklistDocument`]:
//! no I/O, no clocks. The caller supplies `now` and persists the result.
//!
//! Rules:
//! - Completing an item archives it with reason [`ArchiveReason::Completed`] and
//!   reports [`Outcome::Completed`] so the caller can celebrate.
//! - Archiving stamps [`ArchiveReason::Deleted`] and leaves `completed` alone.
//! - Restoring clears the stamp and always resets `completed` to false.
//! - List-level completion, archive and restore cascade to owned tasks. Stamps
//!   applied by a cascade are marked inherited. Reversing a cascade clears
//!   inherited and completion stamps; a task deleted on its own stays archived.
//! - A list is completed iff all its tasks are; this is re-established after
//!   every task-level toggle or restore inside a list.
//! - Unknown ids are never errors, they yield [`Outcome::NotFound`].

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::{ArchiveReason, ArchiveState, ChecklistDocument, ItemKind, Task, TaskList};

/// What happens to the archive stamp when a completed item is un-completed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncompletePolicy {
    /// Clear the stamp, returning the item to the active view.
    #[default]
    Restore,
    /// Leave the item archived; only `completed` flips.
    KeepArchived,
}

/// Policy knobs for lifecycle transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub uncomplete: UncompletePolicy,
    /// When false, toggling completion of an archived item is refused.
    pub allow_toggle_archived: bool,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            uncomplete: UncompletePolicy::Restore,
            allow_toggle_archived: true,
        }
    }
}

/// Result of applying a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No item with the given id exists.
    NotFound,
    /// The item exists but the transition changes nothing.
    Unchanged,
    /// The document was changed.
    Updated,
    /// The document was changed and at least one item became completed.
    Completed,
    /// An item was permanently removed.
    Removed,
}

impl Outcome {
    /// Whether the document was modified.
    pub fn is_change(self) -> bool {
        matches!(self, Outcome::Updated | Outcome::Completed | Outcome::Removed)
    }

    pub fn celebrates(self) -> bool {
        self == Outcome::Completed
    }
}

/// Transitions refused by the lifecycle policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("{kind} '{id}' is archived; restore it before changing its completion")]
    Archived { kind: ItemKind, id: String },
}

/// Where a note lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoteTarget {
    Task(String),
    List(String),
    ListTask { list_id: String, task_id: String },
}

/// A user-triggered change to the checklist document.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    AddTask(Task),
    ToggleTask(String),
    ArchiveTask(String),
    RestoreTask(String),
    DeleteTask(String),

    AddList(TaskList),
    ToggleList(String),
    ArchiveList(String),
    RestoreList(String),
    DeleteList(String),

    AddListTask { list_id: String, task: Task },
    ToggleListTask { list_id: String, task_id: String },
    ArchiveListTask { list_id: String, task_id: String },
    RestoreListTask { list_id: String, task_id: String },
    DeleteListTask { list_id: String, task_id: String },

    SetNote { target: NoteTarget, note: String },
}

/// Applies lifecycle transitions under a fixed policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lifecycle {
    policy: LifecyclePolicy,
}

impl Lifecycle {
    pub fn new(policy: LifecyclePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    /// Apply a mutation to `doc`.
    pub fn apply(&self, doc: &mut ChecklistDocument, mutation: Mutation, now: DateTime<Utc>) -> Result<Outcome, LifecycleError> {
        debug!("Applying mutation {:?}", mutation);
        let outcome = match mutation {
            Mutation::AddTask(task) => {
                doc.tasks.push(task);
                Outcome::Updated
            }
            Mutation::ToggleTask(id) => self.toggle_task(doc, &id, now)?,
            Mutation::ArchiveTask(id) => archive_task(doc, &id, now),
            Mutation::RestoreTask(id) => restore_task(doc, &id),
            Mutation::DeleteTask(id) => delete_task(doc, &id),

            Mutation::AddList(list) => {
                doc.lists.push(list);
                Outcome::Updated
            }
            Mutation::ToggleList(id) => self.toggle_list(doc, &id, now)?,
            Mutation::ArchiveList(id) => archive_list(doc, &id, now),
            Mutation::RestoreList(id) => restore_list(doc, &id),
            Mutation::DeleteList(id) => delete_list(doc, &id),

            Mutation::AddListTask { list_id, task } => match doc.list_mut(&list_id) {
                Some(list) => {
                    list.tasks.push(task);
                    if list.completed {
                        self.reconcile_list(list, now);
                    }
                    Outcome::Updated
                }
                None => Outcome::NotFound,
            },
            Mutation::ToggleListTask { list_id, task_id } => self.toggle_list_task(doc, &list_id, &task_id, now)?,
            Mutation::ArchiveListTask { list_id, task_id } => archive_list_task(doc, &list_id, &task_id, now),
            Mutation::RestoreListTask { list_id, task_id } => self.restore_list_task(doc, &list_id, &task_id, now),
            Mutation::DeleteListTask { list_id, task_id } => delete_list_task(doc, &list_id, &task_id),

            Mutation::SetNote { target, note } => set_note(doc, &target, &note),
        };
        Ok(outcome)
    }

    /// Flip completion of a standalone task.
    pub fn toggle_task(&self, doc: &mut ChecklistDocument, id: &str, now: DateTime<Utc>) -> Result<Outcome, LifecycleError> {
        let Some(task) = doc.task_mut(id) else {
            return Ok(Outcome::NotFound);
        };
        self.check_toggle_allowed(ItemKind::Task, id, task.is_archived())?;
        Ok(self.flip_task(task, now))
    }

    /// Flip completion of a list, cascading to its tasks.
    pub fn toggle_list(&self, doc: &mut ChecklistDocument, id: &str, now: DateTime<Utc>) -> Result<Outcome, LifecycleError> {
        let Some(list) = doc.list_mut(id) else {
            return Ok(Outcome::NotFound);
        };
        self.check_toggle_allowed(ItemKind::List, id, list.is_archived())?;

        list.completed = !list.completed;
        if list.completed {
            list.archive.stamp(now, ArchiveReason::Completed);
            for task in &mut list.tasks {
                task.completed = true;
                if !task.is_archived() {
                    task.archive.stamp_inherited(now, ArchiveReason::Completed);
                }
            }
            Ok(Outcome::Completed)
        } else {
            self.apply_uncomplete(&mut list.archive);
            for task in &mut list.tasks {
                task.completed = false;
                if task.archive.is_inherited() || task.archive.reason() == Some(ArchiveReason::Completed) {
                    self.apply_uncomplete(&mut task.archive);
                }
            }
            Ok(Outcome::Updated)
        }
    }

    /// Flip completion of a task owned by a list, then reconcile the list.
    pub fn toggle_list_task(
        &self,
        doc: &mut ChecklistDocument,
        list_id: &str,
        task_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Outcome, LifecycleError> {
        let Some(list) = doc.list_mut(list_id) else {
            return Ok(Outcome::NotFound);
        };
        self.check_toggle_allowed(ItemKind::List, list_id, list.is_archived())?;
        let Some(task) = list.task_mut(task_id) else {
            return Ok(Outcome::NotFound);
        };
        self.check_toggle_allowed(ItemKind::Task, task_id, task.is_archived())?;

        let task_outcome = self.flip_task(task, now);
        let list_completed = self.reconcile_list(list, now);
        if task_outcome.celebrates() || list_completed {
            Ok(Outcome::Completed)
        } else {
            Ok(Outcome::Updated)
        }
    }

    /// Restore a task owned by a list, then reconcile the list.
    pub fn restore_list_task(&self, doc: &mut ChecklistDocument, list_id: &str, task_id: &str, now: DateTime<Utc>) -> Outcome {
        let Some(list) = doc.list_mut(list_id) else {
            return Outcome::NotFound;
        };
        let Some(task) = list.task_mut(task_id) else {
            return Outcome::NotFound;
        };
        let outcome = restore(task);
        if outcome.is_change() {
            self.reconcile_list(list, now);
        }
        outcome
    }

    /// Re-establish `list.completed == all(tasks.completed)`.
    ///
    /// Returns true when the list became completed. Lists without tasks are
    /// left untouched.
    pub fn reconcile_list(&self, list: &mut TaskList, now: DateTime<Utc>) -> bool {
        if list.tasks.is_empty() {
            return false;
        }
        let all_completed = list.tasks.iter().all(|t| t.completed);
        if all_completed && !list.completed {
            list.completed = true;
            list.archive.stamp(now, ArchiveReason::Completed);
            debug!("List '{}' completed through its tasks", list.id);
            true
        } else if !all_completed && list.completed {
            list.completed = false;
            self.apply_uncomplete(&mut list.archive);
            debug!("List '{}' re-opened through its tasks", list.id);
            false
        } else {
            false
        }
    }

    fn flip_task(&self, task: &mut Task, now: DateTime<Utc>) -> Outcome {
        task.completed = !task.completed;
        if task.completed {
            task.archive.stamp(now, ArchiveReason::Completed);
            Outcome::Completed
        } else {
            self.apply_uncomplete(&mut task.archive);
            Outcome::Updated
        }
    }

    fn apply_uncomplete(&self, archive: &mut ArchiveState) {
        if self.policy.uncomplete == UncompletePolicy::Restore {
            archive.clear();
        }
    }

    fn check_toggle_allowed(&self, kind: ItemKind, id: &str, archived: bool) -> Result<(), LifecycleError> {
        if archived && !self.policy.allow_toggle_archived {
            return Err(LifecycleError::Archived { kind, id: id.to_string() });
        }
        Ok(())
    }
}

/// Archive a standalone task with reason `deleted`.
pub fn archive_task(doc: &mut ChecklistDocument, id: &str, now: DateTime<Utc>) -> Outcome {
    match doc.task_mut(id) {
        Some(task) => archive(&mut task.archive, now),
        None => Outcome::NotFound,
    }
}

/// Restore a standalone task to active and incomplete.
pub fn restore_task(doc: &mut ChecklistDocument, id: &str) -> Outcome {
    match doc.task_mut(id) {
        Some(task) => restore(task),
        None => Outcome::NotFound,
    }
}

/// Permanently remove a standalone task.
pub fn delete_task(doc: &mut ChecklistDocument, id: &str) -> Outcome {
    remove_by_id(&mut doc.tasks, |t| t.id == id)
}

/// Archive a list with reason `deleted`; its active tasks inherit the stamp.
pub fn archive_list(doc: &mut ChecklistDocument, id: &str, now: DateTime<Utc>) -> Outcome {
    let Some(list) = doc.list_mut(id) else {
        return Outcome::NotFound;
    };
    if list.is_archived() {
        return Outcome::Unchanged;
    }
    list.archive.stamp(now, ArchiveReason::Deleted);
    for task in list.tasks.iter_mut().filter(|t| !t.is_archived()) {
        task.archive.stamp_inherited(now, ArchiveReason::Deleted);
    }
    Outcome::Updated
}

/// Restore a list to active and incomplete, along with the tasks whose
/// stamps were inherited from it and the tasks archived as completed.
/// Tasks archived on their own as deleted stay archived.
pub fn restore_list(doc: &mut ChecklistDocument, id: &str) -> Outcome {
    let Some(list) = doc.list_mut(id) else {
        return Outcome::NotFound;
    };
    if !list.is_archived() && !list.completed {
        return Outcome::Unchanged;
    }
    list.archive.clear();
    list.completed = false;
    for task in list
        .tasks
        .iter_mut()
        .filter(|t| t.archive.is_inherited() || t.completed || t.archive.reason() == Some(ArchiveReason::Completed))
    {
        restore(task);
    }
    Outcome::Updated
}

/// Permanently remove a list and every task it owns.
pub fn delete_list(doc: &mut ChecklistDocument, id: &str) -> Outcome {
    remove_by_id(&mut doc.lists, |l| l.id == id)
}

/// Archive a task owned by a list with reason `deleted`.
pub fn archive_list_task(doc: &mut ChecklistDocument, list_id: &str, task_id: &str, now: DateTime<Utc>) -> Outcome {
    match doc.list_mut(list_id).and_then(|l| l.task_mut(task_id)) {
        Some(task) => archive(&mut task.archive, now),
        None => Outcome::NotFound,
    }
}

/// Permanently remove a task from its list.
pub fn delete_list_task(doc: &mut ChecklistDocument, list_id: &str, task_id: &str) -> Outcome {
    match doc.list_mut(list_id) {
        Some(list) => remove_by_id(&mut list.tasks, |t| t.id == task_id),
        None => Outcome::NotFound,
    }
}

/// Set or clear (empty text) the note of a task, list, or task in a list.
/// Archived items keep accepting note edits.
pub fn set_note(doc: &mut ChecklistDocument, target: &NoteTarget, note: &str) -> Outcome {
    let slot = match target {
        NoteTarget::Task(id) => doc.task_mut(id).map(|t| &mut t.note),
        NoteTarget::List(id) => doc.list_mut(id).map(|l| &mut l.note),
        NoteTarget::ListTask { list_id, task_id } => doc
            .list_mut(list_id)
            .and_then(|l| l.task_mut(task_id))
            .map(|t| &mut t.note),
    };
    let Some(slot) = slot else {
        return Outcome::NotFound;
    };

    let next = if note.trim().is_empty() { None } else { Some(note.to_string()) };
    if *slot == next {
        return Outcome::Unchanged;
    }
    *slot = next;
    Outcome::Updated
}

fn archive(state: &mut ArchiveState, now: DateTime<Utc>) -> Outcome {
    if state.is_archived() {
        return Outcome::Unchanged;
    }
    state.stamp(now, ArchiveReason::Deleted);
    Outcome::Updated
}

fn restore(task: &mut Task) -> Outcome {
    if !task.is_archived() && !task.completed {
        return Outcome::Unchanged;
    }
    task.archive.clear();
    task.completed = false;
    Outcome::Updated
}

fn remove_by_id<T>(items: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> Outcome {
    match items.iter().position(matches) {
        Some(index) => {
            items.remove(index);
            Outcome::Removed
        }
        None => Outcome::NotFound,
    }
}
