use chrono::Utc;
use clap::Subcommand;
use etude_core::storage::TaskList;

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks, open ones first
    List {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a task
    Add {
        title: String,
        #[arg(long)]
        subject: Option<String>,
    },
    /// Mark a task as done
    Done { id: String },
    /// Mark a task as open again
    Reopen { id: String },
    /// Delete a task
    Delete { id: String },
}

pub fn run(action: TaskAction) -> CliResult {
    let list = TaskList::new(open_store()?);

    match action {
        TaskAction::List { json } => {
            let tasks = list.pending_first();
            if json {
                return print_json(&tasks);
            }
            for task in &tasks {
                let mark = if task.completed { "x" } else { " " };
                let subject = task
                    .subject
                    .as_deref()
                    .map(|s| format!("  [{s}]"))
                    .unwrap_or_default();
                println!("[{mark}] {}  {}{subject}", task.id, task.title);
            }
        }
        TaskAction::Add { title, subject } => {
            let task = list.add(&title, subject.as_deref(), Utc::now())?;
            print_json(&task)?;
        }
        TaskAction::Done { id } => set_completed(&list, &id, true)?,
        TaskAction::Reopen { id } => set_completed(&list, &id, false)?,
        TaskAction::Delete { id } => {
            if !list.delete(&id)? {
                return Err(format!("no task with id '{id}'").into());
            }
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn set_completed(list: &TaskList, id: &str, completed: bool) -> CliResult {
    if !list.set_completed(id, completed)? {
        return Err(format!("no task with id '{id}'").into());
    }
    print_json(&serde_json::json!({ "id": id, "completed": completed }))
}
