use anyhow::{bail, Context, Result};
use chrono::Utc;

use checklist::config::Config;
use checklist::constants::{EMPTY_ARCHIVE, EMPTY_SEARCH, ENV_USER_ID, ERROR_NO_USER_ID};
use checklist::lifecycle::{Lifecycle, Mutation};
use checklist::logger::Logger;
use checklist::model::{Task, UserId};
use checklist::store::create_store;
use checklist::sync::SyncService;
use checklist::utils::datetime::{describe_deadline, format_timestamp, parse_deadline};
use checklist::views::{deadline_urgency, ArchiveEntry, ArchiveLog, ChecklistView, DeadlineUrgency, Partition, SearchQuery};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    Logger::install(&config.logging)?;

    // Check if a user id is set
    let Ok(user_id) = std::env::var(ENV_USER_ID) else {
        eprintln!("{}", ERROR_NO_USER_ID);
        eprintln!("\n💡 To use this app:");
        eprintln!("1. Pick the user whose checklist to show");
        eprintln!("2. Set it as environment variable: export {}=your_user_id", ENV_USER_ID);
        eprintln!("3. Run the app again, optionally with --archived and a search query");
        eprintln!("   or add a task with: checklist add TEXT [--due YYYY-MM-DDTHH:MM]");
        return Ok(());
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let store = create_store(&config.store).await?;
    let lifecycle = Lifecycle::new(config.lifecycle.policy());
    let sync = SyncService::connect(store, UserId::from(user_id), lifecycle).await?;

    if args.first().is_some_and(|arg| arg == "add") {
        let task = task_from_args(&args[1..])?;
        let line = task_line(&task, &config.display.timestamp_format);
        let applied = sync.apply(Mutation::AddTask(task)).await;
        sync.shutdown();
        applied?;
        println!("Added {}", line);
        return Ok(());
    }

    let mut partition = Partition::Active;
    let mut query = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--archived" => partition = Partition::Archived,
            _ => query.push(arg),
        }
    }
    let query = SearchQuery::new(query.join(" "));

    let doc = sync.snapshot();
    sync.shutdown();

    let format = &config.display.timestamp_format;
    print_view(&ChecklistView::build(&doc, partition, &query), format);
    if partition == Partition::Archived {
        print_archive_log(&ArchiveLog::build(&doc), format);
    }
    Ok(())
}

/// Build a standalone task from `TEXT... [--due DEADLINE]`.
fn task_from_args(args: &[String]) -> Result<Task> {
    let mut words = Vec::new();
    let mut deadline = None;
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        if arg == "--due" {
            let Some(value) = args.next() else {
                bail!("--due needs a deadline such as 2025-01-15T14:30");
            };
            let parsed = parse_deadline(value).with_context(|| format!("Invalid deadline '{}'", value))?;
            deadline = Some(parsed);
        } else {
            words.push(arg.as_str());
        }
    }

    let text = words.join(" ");
    if text.trim().is_empty() {
        bail!("Nothing to add: give the task text after 'add'");
    }
    let task = Task::new(text);
    Ok(match deadline {
        Some(deadline) => task.with_deadline(deadline),
        None => task,
    })
}

fn print_view(view: &ChecklistView, format: &str) {
    println!(
        "{} - tasks {}% ({}/{}), lists {}% ({}/{})",
        view.partition.title(),
        view.task_progress.percentage(),
        view.task_progress.completed,
        view.task_progress.total,
        view.list_progress.percentage(),
        view.list_progress.completed,
        view.list_progress.total
    );
    if view.is_empty() {
        println!("  {}", EMPTY_SEARCH);
        return;
    }

    for task in &view.tasks {
        println!("  {}", task_line(task, format));
    }
    for list in &view.lists {
        let mark = if list.completed { "✓" } else { " " };
        println!("  [{}] {} ({}/{})", mark, list.name, list.completed_task_count(), list.tasks.len());
        for task in &list.tasks {
            println!("      {}", task_line(task, format));
        }
    }
}

fn task_line(task: &Task, format: &str) -> String {
    let mark = if task.completed { "✓" } else { " " };
    let mut line = format!("[{}] {}", mark, task.text);
    if let Some(deadline) = task.deadline {
        let now = Utc::now();
        let flag = match deadline_urgency(task, now) {
            DeadlineUrgency::Overdue => "❗",
            DeadlineUrgency::DueWithinHour | DeadlineUrgency::DueWithinDay => "⏰",
            DeadlineUrgency::None => "",
        };
        line.push_str(&format!(
            "  {}due {} ({})",
            flag,
            format_timestamp(deadline, format),
            describe_deadline(deadline, now)
        ));
    }
    line
}

fn print_archive_log(log: &ArchiveLog, format: &str) {
    println!();
    if log.is_empty() {
        println!("{}", EMPTY_ARCHIVE);
        return;
    }
    print_entries("Completed tasks", &log.completed_tasks, format);
    print_entries("Deleted tasks", &log.deleted_tasks, format);
    print_entries("Completed lists", &log.completed_lists, format);
    print_entries("Deleted lists", &log.deleted_lists, format);
}

fn print_entries(title: &str, entries: &[ArchiveEntry], format: &str) {
    if entries.is_empty() {
        return;
    }
    println!("{}:", title);
    for entry in entries {
        let count = entry.task_count.map(|n| format!(" ({} tasks)", n)).unwrap_or_default();
        println!("  {} {}{}", format_timestamp(entry.archived_at, format), entry.label, count);
    }
}
