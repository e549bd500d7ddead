use chrono::{DateTime, TimeZone, Utc};
use checklist::lifecycle::{
    Lifecycle, LifecycleError, LifecyclePolicy, Mutation, NoteTarget, Outcome, UncompletePolicy,
};
use checklist::model::{ArchiveReason, ChecklistDocument, ItemKind, Task, TaskList};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, hour, 0, 0).unwrap()
}

fn doc_with_task(text: &str) -> (ChecklistDocument, String) {
    let task = Task::new(text);
    let id = task.id.clone();
    let doc = ChecklistDocument {
        tasks: vec![task],
        ..Default::default()
    };
    (doc, id)
}

fn doc_with_list(task_count: usize) -> (ChecklistDocument, String, Vec<String>) {
    let tasks: Vec<Task> = (0..task_count).map(|i| Task::new(format!("Item {i}"))).collect();
    let task_ids = tasks.iter().map(|t| t.id.clone()).collect();
    let list = TaskList::new("Groceries").with_tasks(tasks);
    let list_id = list.id.clone();
    let doc = ChecklistDocument {
        lists: vec![list],
        ..Default::default()
    };
    (doc, list_id, task_ids)
}

fn keep_archived() -> Lifecycle {
    Lifecycle::new(LifecyclePolicy {
        uncomplete: UncompletePolicy::KeepArchived,
        allow_toggle_archived: true,
    })
}

#[test]
fn test_complete_task_archives_and_celebrates() {
    let (mut doc, id) = doc_with_task("Water plants");
    let outcome = Lifecycle::default().toggle_task(&mut doc, &id, at(9)).unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert!(outcome.celebrates());
    let task = doc.task(&id).unwrap();
    assert!(task.completed);
    assert_eq!(task.archive.reason(), Some(ArchiveReason::Completed));
    assert_eq!(task.archive.archived_at(), Some(at(9)));
    assert!(!task.archive.is_inherited());
}

#[test]
fn test_uncomplete_task_restores_by_default() {
    let (mut doc, id) = doc_with_task("Water plants");
    let lifecycle = Lifecycle::default();
    lifecycle.toggle_task(&mut doc, &id, at(9)).unwrap();
    let outcome = lifecycle.toggle_task(&mut doc, &id, at(10)).unwrap();

    assert_eq!(outcome, Outcome::Updated);
    let task = doc.task(&id).unwrap();
    assert!(!task.completed);
    assert!(!task.is_archived());
}

#[test]
fn test_uncomplete_task_keep_archived_policy() {
    let (mut doc, id) = doc_with_task("Water plants");
    let lifecycle = keep_archived();
    lifecycle.toggle_task(&mut doc, &id, at(9)).unwrap();
    lifecycle.toggle_task(&mut doc, &id, at(10)).unwrap();

    let task = doc.task(&id).unwrap();
    assert!(!task.completed);
    assert_eq!(task.archive.reason(), Some(ArchiveReason::Completed));
}

#[test]
fn test_toggle_archived_task_refused_when_disallowed() {
    let (mut doc, id) = doc_with_task("Water plants");
    checklist::lifecycle::archive_task(&mut doc, &id, at(9));

    let lifecycle = Lifecycle::new(LifecyclePolicy {
        allow_toggle_archived: false,
        ..Default::default()
    });
    let err = lifecycle.toggle_task(&mut doc, &id, at(10)).unwrap_err();
    assert_eq!(
        err,
        LifecycleError::Archived {
            kind: ItemKind::Task,
            id: id.clone()
        }
    );
    assert!(!doc.task(&id).unwrap().completed);
}

#[test]
fn test_archive_task_keeps_completion_flag() {
    let (mut doc, id) = doc_with_task("Call mom");
    let outcome = checklist::lifecycle::archive_task(&mut doc, &id, at(9));

    assert_eq!(outcome, Outcome::Updated);
    let task = doc.task(&id).unwrap();
    assert!(!task.completed);
    assert_eq!(task.archive.reason(), Some(ArchiveReason::Deleted));

    // Archiving twice keeps the first stamp
    let again = checklist::lifecycle::archive_task(&mut doc, &id, at(11));
    assert_eq!(again, Outcome::Unchanged);
    assert_eq!(doc.task(&id).unwrap().archive.archived_at(), Some(at(9)));
}

#[test]
fn test_restore_task_resets_completion() {
    let (mut doc, id) = doc_with_task("Call mom");
    Lifecycle::default().toggle_task(&mut doc, &id, at(9)).unwrap();

    let outcome = checklist::lifecycle::restore_task(&mut doc, &id);
    assert_eq!(outcome, Outcome::Updated);
    let task = doc.task(&id).unwrap();
    assert!(!task.completed);
    assert!(!task.is_archived());

    assert_eq!(checklist::lifecycle::restore_task(&mut doc, &id), Outcome::Unchanged);
}

#[test]
fn test_unknown_ids_are_not_found() {
    let mut doc = ChecklistDocument::default();
    let lifecycle = Lifecycle::default();

    for mutation in [
        Mutation::ToggleTask("missing".into()),
        Mutation::ArchiveTask("missing".into()),
        Mutation::RestoreTask("missing".into()),
        Mutation::DeleteTask("missing".into()),
        Mutation::ToggleList("missing".into()),
        Mutation::ArchiveList("missing".into()),
        Mutation::RestoreList("missing".into()),
        Mutation::DeleteList("missing".into()),
        Mutation::AddListTask {
            list_id: "missing".into(),
            task: Task::new("orphan"),
        },
        Mutation::ToggleListTask {
            list_id: "missing".into(),
            task_id: "missing".into(),
        },
    ] {
        assert_eq!(lifecycle.apply(&mut doc, mutation, at(9)), Ok(Outcome::NotFound));
    }
    assert_eq!(doc, ChecklistDocument::default());
}

#[test]
fn test_delete_task_removes_permanently() {
    let (mut doc, id) = doc_with_task("Call mom");
    assert_eq!(checklist::lifecycle::delete_task(&mut doc, &id), Outcome::Removed);
    assert!(doc.tasks.is_empty());
    assert_eq!(checklist::lifecycle::delete_task(&mut doc, &id), Outcome::NotFound);
}

#[test]
fn test_complete_list_cascades_to_tasks() {
    let (mut doc, list_id, task_ids) = doc_with_list(3);
    let outcome = Lifecycle::default().toggle_list(&mut doc, &list_id, at(9)).unwrap();

    assert_eq!(outcome, Outcome::Completed);
    let list = doc.list(&list_id).unwrap();
    assert!(list.completed);
    assert_eq!(list.archive.reason(), Some(ArchiveReason::Completed));
    for id in &task_ids {
        let task = list.task(id).unwrap();
        assert!(task.completed);
        assert_eq!(task.archive.reason(), Some(ArchiveReason::Completed));
        assert!(task.archive.is_inherited());
    }
}

#[test]
fn test_uncomplete_list_keeps_own_deleted_stamps() {
    let (mut doc, list_id, task_ids) = doc_with_list(2);
    let lifecycle = Lifecycle::default();

    // The first task was archived on its own before the list was completed
    checklist::lifecycle::archive_list_task(&mut doc, &list_id, &task_ids[0], at(8));
    lifecycle.toggle_list(&mut doc, &list_id, at(9)).unwrap();
    lifecycle.toggle_list(&mut doc, &list_id, at(10)).unwrap();

    let list = doc.list(&list_id).unwrap();
    assert!(!list.completed);
    assert!(!list.is_archived());
    assert!(list.tasks.iter().all(|t| !t.completed));

    let own = list.task(&task_ids[0]).unwrap();
    assert_eq!(own.archive.reason(), Some(ArchiveReason::Deleted));
    assert_eq!(own.archive.archived_at(), Some(at(8)));
    assert!(!list.task(&task_ids[1]).unwrap().is_archived());
}

#[test]
fn test_toggling_last_task_completes_list() {
    let (mut doc, list_id, task_ids) = doc_with_list(2);
    let lifecycle = Lifecycle::default();

    let first = lifecycle.toggle_list_task(&mut doc, &list_id, &task_ids[0], at(9)).unwrap();
    assert_eq!(first, Outcome::Completed);
    assert!(!doc.list(&list_id).unwrap().completed);

    lifecycle.toggle_list_task(&mut doc, &list_id, &task_ids[1], at(10)).unwrap();
    let list = doc.list(&list_id).unwrap();
    assert!(list.completed);
    assert_eq!(list.archive.reason(), Some(ArchiveReason::Completed));
    assert_eq!(list.archive.archived_at(), Some(at(10)));
}

#[test]
fn test_uncompleting_task_reopens_completed_list() {
    let (mut doc, list_id, task_ids) = doc_with_list(2);
    let lifecycle = Lifecycle::default();
    lifecycle.toggle_list(&mut doc, &list_id, at(9)).unwrap();

    let outcome = lifecycle.toggle_list_task(&mut doc, &list_id, &task_ids[0], at(10)).unwrap();
    assert_eq!(outcome, Outcome::Updated);

    let list = doc.list(&list_id).unwrap();
    assert!(!list.completed);
    assert!(!list.is_archived());
    assert!(!list.task(&task_ids[0]).unwrap().completed);
    assert!(list.task(&task_ids[1]).unwrap().completed);
}

#[test]
fn test_list_completion_matches_tasks_after_every_toggle() {
    let (mut doc, list_id, task_ids) = doc_with_list(3);
    let lifecycle = Lifecycle::default();
    let sequence = [0, 1, 2, 1, 1, 0, 0, 2, 2];

    for (step, index) in sequence.iter().enumerate() {
        lifecycle
            .toggle_list_task(&mut doc, &list_id, &task_ids[*index], at(step as u32))
            .unwrap();
        let list = doc.list(&list_id).unwrap();
        assert_eq!(list.completed, list.tasks.iter().all(|t| t.completed), "step {step}");
    }
}

#[test]
fn test_empty_list_is_not_reconciled() {
    let (mut doc, list_id, _) = doc_with_list(0);
    let lifecycle = Lifecycle::default();
    let list = doc.list_mut(&list_id).unwrap();
    assert!(!lifecycle.reconcile_list(list, at(9)));
    assert!(!list.completed);
}

#[test]
fn test_adding_task_to_completed_list_reopens_it() {
    let (mut doc, list_id, _) = doc_with_list(1);
    let lifecycle = Lifecycle::default();
    lifecycle.toggle_list(&mut doc, &list_id, at(9)).unwrap();

    let outcome = lifecycle
        .apply(
            &mut doc,
            Mutation::AddListTask {
                list_id: list_id.clone(),
                task: Task::new("Milk"),
            },
            at(10),
        )
        .unwrap();
    assert_eq!(outcome, Outcome::Updated);
    let list = doc.list(&list_id).unwrap();
    assert!(!list.completed);
    assert!(!list.is_archived());
}

#[test]
fn test_archive_list_cascades_and_restore_reverses() {
    let (mut doc, list_id, task_ids) = doc_with_list(3);
    let lifecycle = Lifecycle::default();
    lifecycle.toggle_list_task(&mut doc, &list_id, &task_ids[0], at(8)).unwrap();
    checklist::lifecycle::archive_list_task(&mut doc, &list_id, &task_ids[1], at(8));

    assert_eq!(checklist::lifecycle::archive_list(&mut doc, &list_id, at(9)), Outcome::Updated);
    let list = doc.list(&list_id).unwrap();
    assert_eq!(list.archive.reason(), Some(ArchiveReason::Deleted));
    assert!(list.tasks.iter().all(|t| t.is_archived()));
    // Already-archived tasks keep their own stamps
    let done = list.task(&task_ids[0]).unwrap();
    assert_eq!(done.archive.reason(), Some(ArchiveReason::Completed));
    assert!(!done.archive.is_inherited());
    assert!(!list.task(&task_ids[1]).unwrap().archive.is_inherited());
    assert!(list.task(&task_ids[2]).unwrap().archive.is_inherited());

    assert_eq!(checklist::lifecycle::restore_list(&mut doc, &list_id), Outcome::Updated);
    let list = doc.list(&list_id).unwrap();
    assert!(!list.is_archived());
    assert!(!list.completed);
    assert!(list.tasks.iter().all(|t| !t.completed));
    assert!(!list.task(&task_ids[0]).unwrap().is_archived());
    assert!(!list.task(&task_ids[2]).unwrap().is_archived());
    // Deleted on its own, so it stays in the archive
    assert_eq!(
        list.task(&task_ids[1]).unwrap().archive.reason(),
        Some(ArchiveReason::Deleted)
    );
}

#[test]
fn test_uncomplete_list_restores_tasks_completed_on_their_own() {
    let (mut doc, list_id, task_ids) = doc_with_list(2);
    let lifecycle = Lifecycle::default();
    lifecycle.toggle_list_task(&mut doc, &list_id, &task_ids[0], at(8)).unwrap();
    lifecycle.toggle_list(&mut doc, &list_id, at(9)).unwrap();
    lifecycle.toggle_list(&mut doc, &list_id, at(10)).unwrap();

    let list = doc.list(&list_id).unwrap();
    assert!(!list.completed);
    for task in &list.tasks {
        assert!(!task.completed);
        assert!(!task.is_archived(), "task {} left archived as completed", task.id);
    }
}

#[test]
fn test_restore_auto_completed_list_keeps_completion_consistent() {
    let (mut doc, list_id, task_ids) = doc_with_list(2);
    let lifecycle = Lifecycle::default();
    for id in &task_ids {
        lifecycle.toggle_list_task(&mut doc, &list_id, id, at(9)).unwrap();
    }
    assert!(doc.list(&list_id).unwrap().completed);

    assert_eq!(checklist::lifecycle::restore_list(&mut doc, &list_id), Outcome::Updated);
    let list = doc.list(&list_id).unwrap();
    assert!(!list.is_archived());
    assert_eq!(list.completed, list.tasks.iter().all(|t| t.completed));
    assert!(list.tasks.iter().all(|t| !t.completed && !t.is_archived()));
}

#[test]
fn test_restore_list_task_reconciles_list() {
    let (mut doc, list_id, task_ids) = doc_with_list(2);
    let lifecycle = Lifecycle::default();
    lifecycle.toggle_list(&mut doc, &list_id, at(9)).unwrap();

    let outcome = lifecycle.restore_list_task(&mut doc, &list_id, &task_ids[1], at(10));
    assert_eq!(outcome, Outcome::Updated);
    let list = doc.list(&list_id).unwrap();
    assert!(!list.completed);
    assert!(!list.task(&task_ids[1]).unwrap().completed);
}

#[test]
fn test_delete_list_removes_owned_tasks() {
    let (mut doc, list_id, task_ids) = doc_with_list(2);
    let outcome = checklist::lifecycle::delete_list_task(&mut doc, &list_id, &task_ids[0]);
    assert_eq!(outcome, Outcome::Removed);
    assert_eq!(doc.list(&list_id).unwrap().tasks.len(), 1);
    assert_eq!(
        checklist::lifecycle::delete_list_task(&mut doc, &list_id, &task_ids[0]),
        Outcome::NotFound
    );

    assert_eq!(checklist::lifecycle::delete_list(&mut doc, &list_id), Outcome::Removed);
    assert!(doc.lists.is_empty());
}

#[test]
fn test_set_note_on_all_targets() {
    let (mut doc, list_id, task_ids) = doc_with_list(1);
    let standalone = Task::new("Standalone");
    let task_id = standalone.id.clone();
    doc.tasks.push(standalone);

    let targets = [
        NoteTarget::Task(task_id.clone()),
        NoteTarget::List(list_id.clone()),
        NoteTarget::ListTask {
            list_id: list_id.clone(),
            task_id: task_ids[0].clone(),
        },
    ];
    for target in &targets {
        assert_eq!(checklist::lifecycle::set_note(&mut doc, target, "remember"), Outcome::Updated);
        assert_eq!(checklist::lifecycle::set_note(&mut doc, target, "remember"), Outcome::Unchanged);
    }
    assert_eq!(doc.task(&task_id).unwrap().note.as_deref(), Some("remember"));
    assert_eq!(doc.list(&list_id).unwrap().note.as_deref(), Some("remember"));

    // Blank text clears the note
    assert_eq!(
        checklist::lifecycle::set_note(&mut doc, &targets[0], "   "),
        Outcome::Updated
    );
    assert_eq!(doc.task(&task_id).unwrap().note, None);
    assert_eq!(
        checklist::lifecycle::set_note(&mut doc, &NoteTarget::Task("missing".into()), "x"),
        Outcome::NotFound
    );
}

#[test]
fn test_keep_archived_policy_on_list_cascade() {
    let (mut doc, list_id, _) = doc_with_list(2);
    let lifecycle = keep_archived();
    lifecycle.toggle_list(&mut doc, &list_id, at(9)).unwrap();
    lifecycle.toggle_list(&mut doc, &list_id, at(10)).unwrap();

    let list = doc.list(&list_id).unwrap();
    assert!(!list.completed);
    assert!(list.is_archived());
    assert!(list.tasks.iter().all(|t| !t.completed && t.is_archived()));
}

#[test]
fn test_restore_after_delete_of_archived_task_is_noop() {
    let (mut doc, id) = doc_with_task("Call mom");
    checklist::lifecycle::archive_task(&mut doc, &id, at(9));

    assert_eq!(checklist::lifecycle::delete_task(&mut doc, &id), Outcome::Removed);
    let before = doc.clone();
    assert_eq!(checklist::lifecycle::restore_task(&mut doc, &id), Outcome::NotFound);
    assert_eq!(doc, before);

    let (mut doc, list_id, task_ids) = doc_with_list(1);
    checklist::lifecycle::archive_list(&mut doc, &list_id, at(9));
    assert_eq!(checklist::lifecycle::delete_list(&mut doc, &list_id), Outcome::Removed);
    assert_eq!(checklist::lifecycle::restore_list(&mut doc, &list_id), Outcome::NotFound);
    assert_eq!(
        Lifecycle::default().restore_list_task(&mut doc, &list_id, &task_ids[0], at(10)),
        Outcome::NotFound
    );
    assert!(doc.lists.is_empty());
}

#[test]
fn test_archive_then_restore_keeps_content() {
    let task = Task::new("Call mom").with_note("about Sunday");
    let id = task.id.clone();
    let mut doc = ChecklistDocument {
        tasks: vec![task],
        ..Default::default()
    };

    checklist::lifecycle::archive_task(&mut doc, &id, at(9));
    checklist::lifecycle::restore_task(&mut doc, &id);
    let task = doc.task(&id).unwrap();
    assert_eq!(task.text, "Call mom");
    assert_eq!(task.note.as_deref(), Some("about Sunday"));
    assert!(!task.is_archived());

    let (mut doc, list_id, _) = doc_with_list(2);
    checklist::lifecycle::set_note(&mut doc, &NoteTarget::List(list_id.clone()), "for March");
    let before = doc.list(&list_id).unwrap().clone();
    checklist::lifecycle::archive_list(&mut doc, &list_id, at(9));
    checklist::lifecycle::restore_list(&mut doc, &list_id);
    let list = doc.list(&list_id).unwrap();
    assert_eq!(list.name, before.name);
    assert_eq!(list.note, before.note);
    let texts: Vec<&str> = list.tasks.iter().map(|t| t.text.as_str()).collect();
    let before_texts: Vec<&str> = before.tasks.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, before_texts);
}
