//! Derived views over a checklist document.
//!
//! Views are recomputed from the document on every render and own clones of
//! the items they show, so counters always describe exactly what is rendered.

use chrono::{DateTime, Duration, Utc};

use crate::model::{ArchiveReason, ChecklistDocument, Task, TaskList};

/// Which half of the collection is shown. Every item is in exactly one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Partition {
    #[default]
    Active,
    Archived,
}

impl Partition {
    pub fn admits(self, archived: bool) -> bool {
        match self {
            Partition::Active => !archived,
            Partition::Archived => archived,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Partition::Active => Partition::Archived,
            Partition::Archived => Partition::Active,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Partition::Active => "Active",
            Partition::Archived => "Archived",
        }
    }
}

/// A case-insensitive substring query. The empty query matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchQuery {
    raw: String,
    needle: String,
}

impl SearchQuery {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let needle = raw.to_lowercase();
        Self { raw, needle }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn matches_text(&self, text: &str) -> bool {
        self.is_empty() || text.to_lowercase().contains(&self.needle)
    }

    fn matches_note(&self, note: Option<&str>) -> bool {
        note.is_some_and(|n| self.matches_text(n))
    }

    pub fn matches_task(&self, task: &Task) -> bool {
        self.matches_text(&task.text) || self.matches_note(task.note.as_deref())
    }

    /// A list matches on its own name or note, or on any owned task.
    pub fn matches_list(&self, list: &TaskList) -> bool {
        self.matches_text(&list.name)
            || self.matches_note(list.note.as_deref())
            || list.tasks.iter().any(|t| self.matches_task(t))
    }
}

/// Completed-over-total counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    /// Rounded percentage, 0 for an empty view.
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u8
    }

    /// Progress of a single list; a completed list counts as fully done.
    pub fn of_list(list: &TaskList) -> Self {
        let total = list.tasks.len();
        let completed = if list.completed { total } else { list.completed_task_count() };
        Self::new(completed, total)
    }
}

/// Tasks in `partition` that match `query`, in document order.
pub fn visible_tasks<'a>(tasks: &'a [Task], partition: Partition, query: &SearchQuery) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| partition.admits(t.is_archived()) && query.matches_task(t))
        .collect()
}

/// Lists in `partition` that match `query`, in document order.
pub fn visible_lists<'a>(lists: &'a [TaskList], partition: Partition, query: &SearchQuery) -> Vec<&'a TaskList> {
    lists
        .iter()
        .filter(|l| partition.admits(l.is_archived()) && query.matches_list(l))
        .collect()
}

/// Everything the checklist screen renders for one partition and query.
#[derive(Clone, Debug, PartialEq)]
pub struct ChecklistView {
    pub partition: Partition,
    pub tasks: Vec<Task>,
    pub lists: Vec<TaskList>,
    pub task_progress: Progress,
    pub list_progress: Progress,
}

impl ChecklistView {
    pub fn build(doc: &ChecklistDocument, partition: Partition, query: &SearchQuery) -> Self {
        let tasks: Vec<Task> = visible_tasks(&doc.tasks, partition, query).into_iter().cloned().collect();
        let lists: Vec<TaskList> = visible_lists(&doc.lists, partition, query).into_iter().cloned().collect();

        let task_progress = Progress::new(tasks.iter().filter(|t| t.completed).count(), tasks.len());
        let list_progress = Progress::new(lists.iter().filter(|l| l.completed).count(), lists.len());

        Self {
            partition,
            tasks,
            lists,
            task_progress,
            list_progress,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.lists.is_empty()
    }
}

/// One row of the archive log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub id: String,
    pub label: String,
    pub archived_at: DateTime<Utc>,
    /// Number of owned tasks, for list entries only.
    pub task_count: Option<usize>,
}

/// Archived top-level items grouped by kind and reason, newest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArchiveLog {
    pub completed_tasks: Vec<ArchiveEntry>,
    pub deleted_tasks: Vec<ArchiveEntry>,
    pub completed_lists: Vec<ArchiveEntry>,
    pub deleted_lists: Vec<ArchiveEntry>,
}

impl ArchiveLog {
    pub fn build(doc: &ChecklistDocument) -> Self {
        let mut log = ArchiveLog::default();

        for task in &doc.tasks {
            if let Some(archival) = task.archive.archival() {
                let entry = ArchiveEntry {
                    id: task.id.clone(),
                    label: task.text.clone(),
                    archived_at: archival.at,
                    task_count: None,
                };
                match archival.reason {
                    ArchiveReason::Completed => log.completed_tasks.push(entry),
                    ArchiveReason::Deleted => log.deleted_tasks.push(entry),
                }
            }
        }

        for list in &doc.lists {
            if let Some(archival) = list.archive.archival() {
                let entry = ArchiveEntry {
                    id: list.id.clone(),
                    label: list.name.clone(),
                    archived_at: archival.at,
                    task_count: Some(list.tasks.len()),
                };
                match archival.reason {
                    ArchiveReason::Completed => log.completed_lists.push(entry),
                    ArchiveReason::Deleted => log.deleted_lists.push(entry),
                }
            }
        }

        for group in [
            &mut log.completed_tasks,
            &mut log.deleted_tasks,
            &mut log.completed_lists,
            &mut log.deleted_lists,
        ] {
            group.sort_by(|a, b| b.archived_at.cmp(&a.archived_at));
        }
        log
    }

    pub fn len(&self) -> usize {
        self.completed_tasks.len() + self.deleted_tasks.len() + self.completed_lists.len() + self.deleted_lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How close an open task is to its deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeadlineUrgency {
    None,
    DueWithinDay,
    DueWithinHour,
    Overdue,
}

pub fn deadline_urgency(task: &Task, now: DateTime<Utc>) -> DeadlineUrgency {
    let Some(deadline) = task.deadline else {
        return DeadlineUrgency::None;
    };
    if task.completed {
        return DeadlineUrgency::None;
    }

    let remaining = deadline - now;
    if remaining <= Duration::zero() {
        DeadlineUrgency::Overdue
    } else if remaining <= Duration::hours(1) {
        DeadlineUrgency::DueWithinHour
    } else if remaining <= Duration::days(1) {
        DeadlineUrgency::DueWithinDay
    } else {
        DeadlineUrgency::None
    }
}
