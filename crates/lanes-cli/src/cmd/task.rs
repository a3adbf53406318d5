//! `lanes task`: create, show, edit, remove, reorder, and complete cards.

use anyhow::Result;
use clap::{Args, Subcommand};
use lanes_core::error::ErrorCode;
use lanes_core::model::{Priority, Task, TaskPatch};
use lanes_core::store::{BoardStore, NewTask};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use super::{fail, fail_validation, open_board, resolve_project, resolve_task, settle};
use crate::output::{
    CliError, OutputMode, millis_to_local_datetime, pretty_kv, pretty_section, render,
    render_mode,
};

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add an active task at the end of a project.
    Add(AddArgs),
    /// Show one task.
    Show {
        /// Task id (any unique prefix).
        id: String,
    },
    /// Change a task's fields.
    Edit(EditArgs),
    /// Delete a task.
    Rm {
        /// Task id (any unique prefix).
        id: String,
    },
    /// Move a task to the slot of another task in the same project and status.
    Move {
        /// Task id to move (any unique prefix).
        id: String,
        /// Task whose slot it takes.
        #[arg(long, value_name = "ID")]
        onto: String,
    },
    /// Flip a task between active and done.
    Toggle {
        /// Task id (any unique prefix).
        id: String,
    },
    /// Respace one column of a project to even gaps.
    Renumber {
        /// Project id (any unique prefix).
        #[arg(long, value_name = "ID")]
        project: String,
        /// Renumber the done tasks instead of the active ones.
        #[arg(long)]
        done: bool,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task title.
    pub title: String,

    /// Project to add to (defaults to the first project on the board).
    #[arg(short, long, value_name = "ID")]
    pub project: Option<String>,

    /// Longer description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// Priority: low, medium, or high.
    #[arg(long, default_value_t = Priority::Medium)]
    pub priority: Priority,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Task id (any unique prefix).
    pub id: String,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// New priority: low, medium, or high.
    #[arg(long)]
    pub priority: Option<Priority>,

    /// Mark the task done.
    #[arg(long, conflicts_with = "active")]
    pub done: bool,

    /// Mark the task active.
    #[arg(long)]
    pub active: bool,
}

impl EditArgs {
    fn patch(&self) -> TaskPatch {
        let done = if self.done {
            Some(true)
        } else if self.active {
            Some(false)
        } else {
            None
        };
        TaskPatch {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            done,
            ..TaskPatch::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Removed {
    id: String,
    deleted: bool,
}

#[derive(Debug, Serialize)]
struct Moved<'a> {
    moved: bool,
    task: &'a Task,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Renumbered {
    project_id: String,
    done: bool,
    moved: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_spacing_before: Option<f64>,
}

/// Execute `lanes task <command>`.
///
/// # Errors
///
/// Returns an error if the board cannot be opened, an id does not resolve,
/// the input is invalid, or the store rejects the write.
pub fn run_task(args: &TaskArgs, output: OutputMode, quiet: bool, project_root: &Path) -> Result<()> {
    let (mut store, _) = open_board(output, project_root)?;
    match &args.command {
        TaskCommand::Add(add) => run_add(&mut store, add, output, quiet),
        TaskCommand::Show { id } => {
            let id = resolve_task(&store, output, id)?;
            render_task(&store, output, &id)
        }
        TaskCommand::Edit(edit) => {
            let id = resolve_task(&store, output, &edit.id)?;
            if let Err(e) = store.update_task(&id, edit.patch()) {
                return fail_validation(output, &e);
            }
            settle(&mut store, output, quiet)?;
            render_task(&store, output, &id)
        }
        TaskCommand::Rm { id } => {
            let id = resolve_task(&store, output, id)?;
            let deleted = store.delete_task(&id);
            settle(&mut store, output, quiet)?;
            render(output, &Removed { id, deleted }, |r, w| {
                writeln!(w, "Deleted task {}", r.id)
            })
        }
        TaskCommand::Move { id, onto } => run_move(&mut store, id, onto, output, quiet),
        TaskCommand::Toggle { id } => {
            let id = resolve_task(&store, output, id)?;
            store.toggle_task(&id);
            settle(&mut store, output, quiet)?;
            render_task(&store, output, &id)
        }
        TaskCommand::Renumber { project, done } => {
            let project_id = resolve_project(&store, output, project)?;
            let report = store.renumber_tasks(&project_id, *done);
            settle(&mut store, output, quiet)?;
            let renumbered = Renumbered {
                project_id,
                done: *done,
                moved: report.moved,
                min_spacing_before: report.min_spacing_before,
            };
            render(output, &renumbered, |r, w| {
                let bucket = if r.done { "done" } else { "active" };
                writeln!(w, "Renumbered {} {bucket} tasks in {}", r.moved, r.project_id)
            })
        }
    }
}

fn run_add(store: &mut BoardStore, args: &AddArgs, output: OutputMode, quiet: bool) -> Result<()> {
    let project_id = match &args.project {
        Some(raw) => resolve_project(store, output, raw)?,
        None => match store.last_used_project_id() {
            Some(id) => id.to_string(),
            None => {
                return fail(
                    output,
                    &CliError::from_code(
                        ErrorCode::ProjectNotFound,
                        "the board has no projects; add one with `lanes project add <title>`",
                    ),
                );
            }
        },
    };

    let input = NewTask {
        project_id: project_id.clone(),
        title: args.title.clone(),
        description: args.description.clone(),
        priority: args.priority,
    };
    let id = match store.add_task(input) {
        Ok(Some(id)) => id,
        Ok(None) => {
            return fail(
                output,
                &CliError::from_code(
                    ErrorCode::ProjectNotFound,
                    format!("project '{project_id}' not found"),
                ),
            );
        }
        Err(e) => return fail_validation(output, &e),
    };
    settle(store, output, quiet)?;
    render_task(store, output, &id)
}

fn run_move(
    store: &mut BoardStore,
    id: &str,
    onto: &str,
    output: OutputMode,
    quiet: bool,
) -> Result<()> {
    let id = resolve_task(store, output, id)?;
    let onto = resolve_task(store, output, onto)?;
    if let (Some(active), Some(over)) = (store.board().task_by_id(&id), store.board().task_by_id(&onto))
        && !active.same_bucket(over)
    {
        return fail(
            output,
            &CliError::from_code(
                ErrorCode::ValidationFailed,
                format!("task '{id}' and '{onto}' are not in the same project and status"),
            ),
        );
    }

    let moved = store.reorder_tasks(&id, &onto);
    settle(store, output, quiet)?;
    let Some(task) = store.board().task_by_id(&id) else {
        return gone(output, &id);
    };
    render(output, &Moved { moved, task }, |m, w| {
        if m.moved {
            writeln!(w, "Moved {} to position {}", m.task.id, m.task.position)
        } else {
            writeln!(w, "{} unchanged", m.task.id)
        }
    })
}

fn gone<T>(output: OutputMode, id: &str) -> Result<T> {
    fail(
        output,
        &CliError::from_code(
            ErrorCode::TaskNotFound,
            format!("task '{id}' is no longer on the board"),
        ),
    )
}

/// One-line task rendering shared with `lanes list`.
pub fn write_task_line(w: &mut dyn Write, task: &Task) -> io::Result<()> {
    let mark = if task.done { "x" } else { " " };
    writeln!(
        w,
        "[{mark}] {}  {:<6}  {}",
        task.id,
        task.priority.as_str(),
        task.title
    )
}

fn render_task(store: &BoardStore, output: OutputMode, id: &str) -> Result<()> {
    let Some(task) = store.board().task_by_id(id) else {
        return gone(output, id);
    };
    let project_title = store
        .project_by_id(&task.project_id)
        .map_or_else(|| task.project_id.clone(), |p| p.title.clone());

    render_mode(
        output,
        task,
        |t, w| write_task_line(w, t),
        |t, w| {
            pretty_section(w, &t.title)?;
            pretty_kv(w, "id", &t.id)?;
            pretty_kv(w, "project", &project_title)?;
            pretty_kv(w, "priority", t.priority.as_str())?;
            pretty_kv(w, "status", if t.done { "done" } else { "active" })?;
            pretty_kv(w, "position", t.position.to_string())?;
            pretty_kv(w, "created", millis_to_local_datetime(t.created_at))?;
            if let Some(completed_at) = t.completed_at {
                pretty_kv(w, "completed", millis_to_local_datetime(completed_at))?;
            }
            if let Some(description) = &t.description {
                writeln!(w)?;
                writeln!(w, "{description}")?;
            }
            Ok(())
        },
    )
}
