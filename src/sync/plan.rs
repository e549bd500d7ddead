//! Turns a local document change into per-item store writes.

use chrono::{DateTime, Utc};

use crate::model::{ChecklistDocument, Task, TaskList};

/// One addressed write against the store.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemWrite {
    PutTask { task: Task, base_version: Option<u64> },
    DeleteTask { id: String, base_version: u64 },
    PutList { list: TaskList, base_version: Option<u64> },
    DeleteList { id: String, base_version: u64 },
}

/// Compare `before` with `after` and list the writes needed to bring the
/// store from one to the other.
///
/// Changed and new items in `after` get their version bumped and
/// `updated_at` stamped; the previous version becomes the write's base
/// version. A list is written as a whole, tasks included.
pub fn plan_writes(before: &ChecklistDocument, after: &mut ChecklistDocument, now: DateTime<Utc>) -> Vec<ItemWrite> {
    let mut writes = Vec::new();

    for task in &mut after.tasks {
        let previous = before.task(&task.id);
        if previous == Some(&*task) {
            continue;
        }
        let base_version = previous.map(|p| p.version);
        task.version = base_version.map_or(1, |v| v + 1);
        task.updated_at = Some(now);
        writes.push(ItemWrite::PutTask {
            task: task.clone(),
            base_version,
        });
    }
    for task in &before.tasks {
        if after.task(&task.id).is_none() {
            writes.push(ItemWrite::DeleteTask {
                id: task.id.clone(),
                base_version: task.version,
            });
        }
    }

    for list in &mut after.lists {
        let previous = before.list(&list.id);
        if previous == Some(&*list) {
            continue;
        }
        let base_version = previous.map(|p| p.version);
        list.version = base_version.map_or(1, |v| v + 1);
        list.updated_at = Some(now);
        writes.push(ItemWrite::PutList {
            list: list.clone(),
            base_version,
        });
    }
    for list in &before.lists {
        if after.list(&list.id).is_none() {
            writes.push(ItemWrite::DeleteList {
                id: list.id.clone(),
                base_version: list.version,
            });
        }
    }

    writes
}
