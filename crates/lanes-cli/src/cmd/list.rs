//! `lanes list`: the board view, one column per project.

use anyhow::Result;
use clap::Args;
use lanes_core::filter::{FilterSpec, FilterUpdate, PriorityFilter, StatusFilter};
use lanes_core::model::{Project, Task};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use super::{open_board, resolve_project};
use super::task::write_task_line;
use crate::output::{OutputMode, pretty_rule, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only show this project (any unique id prefix).
    #[arg(short, long, value_name = "ID")]
    pub project: Option<String>,

    /// Case-insensitive text match on title and description.
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Priority filter: all, low, medium, or high.
    #[arg(long)]
    pub priority: Option<PriorityFilter>,

    /// Status filter: all, active, or done.
    #[arg(long)]
    pub status: Option<StatusFilter>,
}

impl ListArgs {
    fn filter_update(&self) -> FilterUpdate {
        FilterUpdate {
            query: self.search.clone(),
            priority: self.priority,
            status: self.status,
        }
    }
}

#[derive(Debug, Serialize)]
struct Column<'a> {
    #[serde(flatten)]
    project: &'a Project,
    tasks: Vec<&'a Task>,
}

#[derive(Debug, Serialize)]
struct BoardView<'a> {
    filters: &'a FilterSpec,
    projects: Vec<Column<'a>>,
}

/// Execute `lanes list`.
///
/// Filters start from the `[view]` section of `.lanes/config.toml`; flags
/// override it field by field.
///
/// # Errors
///
/// Returns an error if the board cannot be opened or output fails.
pub fn run_list(args: &ListArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let (mut store, config) = open_board(output, project_root)?;
    let only = match &args.project {
        Some(raw) => Some(resolve_project(&store, output, raw)?),
        None => None,
    };

    let defaults = config.view.filters();
    store.set_filters(FilterUpdate {
        query: Some(defaults.query),
        priority: Some(defaults.priority),
        status: Some(defaults.status),
    });
    store.set_filters(args.filter_update());

    let board = store.board();
    let view = BoardView {
        filters: board.filters(),
        projects: board
            .ordered_projects()
            .into_iter()
            .filter(|project| only.as_deref().is_none_or(|id| id == project.id))
            .map(|project| Column {
                project,
                tasks: board.visible_tasks(&project.id),
            })
            .collect(),
    };

    render_mode(
        output,
        &view,
        |view, w| {
            for column in &view.projects {
                writeln!(w, "# {}  {}", column.project.id, column.project.title)?;
                for task in &column.tasks {
                    write_task_line(w, task)?;
                }
            }
            Ok(())
        },
        |view, w| {
            if view.projects.is_empty() {
                return writeln!(w, "No projects yet. Add one with `lanes project add <title>`.");
            }
            let f = view.filters;
            if *f != FilterSpec::default() {
                writeln!(
                    w,
                    "filters: priority={} status={} search={:?}",
                    f.priority, f.status, f.query
                )?;
                pretty_rule(w)?;
            }
            for column in &view.projects {
                pretty_section(
                    w,
                    &format!("{} ({})", column.project.title, column.tasks.len()),
                )?;
                if column.tasks.is_empty() {
                    writeln!(w, "  (empty)")?;
                }
                for task in &column.tasks {
                    write!(w, "  ")?;
                    write_task_line(w, task)?;
                }
                writeln!(w)?;
            }
            Ok(())
        },
    )
}
