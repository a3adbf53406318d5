//! `lanes project`: create, rename, remove, reorder, and list board columns.

use anyhow::Result;
use clap::{Args, Subcommand};
use lanes_core::error::ErrorCode;
use lanes_core::model::Project;
use lanes_core::store::BoardStore;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use super::{fail, fail_validation, open_board, resolve_project, settle};
use crate::output::{
    CliError, OutputMode, millis_to_local_datetime, pretty_kv, pretty_section, render,
    render_mode,
};

#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Add a project after the last one.
    Add {
        /// Project title.
        title: String,
    },
    /// List projects in board order.
    List,
    /// Rename a project.
    Rename {
        /// Project id (any unique prefix).
        id: String,
        /// New title.
        title: String,
    },
    /// Delete a project and every task in it.
    Rm {
        /// Project id (any unique prefix).
        id: String,
    },
    /// Move a project to the slot of another project.
    Move {
        /// Project id to move (any unique prefix).
        id: String,
        /// Project whose slot it takes.
        #[arg(long, value_name = "ID")]
        onto: String,
    },
}

/// A project with its task counts, as listed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRow<'a> {
    #[serde(flatten)]
    project: &'a Project,
    active: usize,
    done: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Removed {
    id: String,
    deleted: bool,
    tasks_removed: usize,
}

#[derive(Debug, Serialize)]
struct Moved<'a> {
    moved: bool,
    project: &'a Project,
}

/// Execute `lanes project <command>`.
///
/// # Errors
///
/// Returns an error if the board cannot be opened, an id does not resolve,
/// the input is invalid, or the store rejects the write.
pub fn run_project(
    args: &ProjectArgs,
    output: OutputMode,
    quiet: bool,
    project_root: &Path,
) -> Result<()> {
    let (mut store, _) = open_board(output, project_root)?;
    match &args.command {
        ProjectCommand::Add { title } => {
            let id = match store.add_project(title) {
                Ok(id) => id,
                Err(e) => return fail_validation(output, &e),
            };
            settle(&mut store, output, quiet)?;
            render_project(&store, output, &id)
        }
        ProjectCommand::List => list_projects(&store, output),
        ProjectCommand::Rename { id, title } => {
            let id = resolve_project(&store, output, id)?;
            if let Err(e) = store.rename_project(&id, title) {
                return fail_validation(output, &e);
            }
            settle(&mut store, output, quiet)?;
            render_project(&store, output, &id)
        }
        ProjectCommand::Rm { id } => {
            let id = resolve_project(&store, output, id)?;
            let tasks_removed = store
                .board()
                .tasks()
                .iter()
                .filter(|task| task.project_id == id)
                .count();
            let deleted = store.delete_project(&id);
            settle(&mut store, output, quiet)?;
            let removed = Removed {
                id,
                deleted,
                tasks_removed,
            };
            render(output, &removed, |r, w| {
                writeln!(w, "Removed project {} ({} tasks)", r.id, r.tasks_removed)
            })
        }
        ProjectCommand::Move { id, onto } => {
            let id = resolve_project(&store, output, id)?;
            let onto = resolve_project(&store, output, onto)?;
            let moved = store.reorder_projects(&id, &onto);
            settle(&mut store, output, quiet)?;
            let Some(project) = store.project_by_id(&id) else {
                return gone(output, &id);
            };
            render(output, &Moved { moved, project }, |m, w| {
                if m.moved {
                    writeln!(w, "Moved {} to position {}", m.project.id, m.project.position)
                } else {
                    writeln!(w, "{} unchanged", m.project.id)
                }
            })
        }
    }
}

fn gone<T>(output: OutputMode, id: &str) -> Result<T> {
    fail(
        output,
        &CliError::from_code(
            ErrorCode::ProjectNotFound,
            format!("project '{id}' is no longer on the board"),
        ),
    )
}

fn render_project(store: &BoardStore, output: OutputMode, id: &str) -> Result<()> {
    let Some(project) = store.project_by_id(id) else {
        return gone(output, id);
    };
    render_mode(
        output,
        project,
        |p, w| writeln!(w, "{}  {}", p.id, p.title),
        |p, w| {
            pretty_section(w, &p.title)?;
            pretty_kv(w, "id", &p.id)?;
            pretty_kv(w, "position", p.position.to_string())?;
            pretty_kv(w, "created", millis_to_local_datetime(p.created_at))
        },
    )
}

fn list_projects(store: &BoardStore, output: OutputMode) -> Result<()> {
    let tasks = store.board().tasks();
    let rows: Vec<ProjectRow<'_>> = store
        .board()
        .ordered_projects()
        .into_iter()
        .map(|project| {
            let (done, active): (Vec<_>, Vec<_>) = tasks
                .iter()
                .filter(|task| task.project_id == project.id)
                .partition(|task| task.done);
            ProjectRow {
                project,
                active: active.len(),
                done: done.len(),
            }
        })
        .collect();

    render_mode(
        output,
        &rows,
        |rows, w| {
            for row in rows {
                writeln!(
                    w,
                    "{}  {}  active={} done={}",
                    row.project.id, row.project.title, row.active, row.done
                )?;
            }
            Ok(())
        },
        |rows, w| {
            if rows.is_empty() {
                return writeln!(w, "No projects yet. Add one with `lanes project add <title>`.");
            }
            pretty_section(w, "Projects")?;
            for row in rows {
                writeln!(
                    w,
                    "{:<24} {:<32} {:>3} active {:>3} done",
                    row.project.id, row.project.title, row.active, row.done
                )?;
            }
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ProjectArgs,
    }

    #[test]
    fn add_takes_positional_title() {
        let w = Wrapper::parse_from(["test", "add", "Backlog"]);
        assert!(matches!(w.args.command, ProjectCommand::Add { ref title } if title == "Backlog"));
    }

    #[test]
    fn move_requires_onto() {
        assert!(Wrapper::try_parse_from(["test", "move", "p1"]).is_err());
        let w = Wrapper::parse_from(["test", "move", "p1", "--onto", "p2"]);
        assert!(matches!(
            w.args.command,
            ProjectCommand::Move { ref id, ref onto } if id == "p1" && onto == "p2"
        ));
    }

    #[test]
    fn rename_and_rm_parse() {
        let w = Wrapper::parse_from(["test", "rename", "p1", "Later"]);
        assert!(matches!(w.args.command, ProjectCommand::Rename { .. }));
        let w = Wrapper::parse_from(["test", "rm", "p1"]);
        assert!(matches!(w.args.command, ProjectCommand::Rm { .. }));
        let w = Wrapper::parse_from(["test", "list"]);
        assert!(matches!(w.args.command, ProjectCommand::List));
    }
}
