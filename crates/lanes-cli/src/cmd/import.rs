use anyhow::{Context as _, Result};
use clap::Args;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use super::{fail, open_board, settle};
use crate::output::{CliError, OutputMode, pretty_kv, render};

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Backup file written by `lanes export`, or `-` for stdin.
    #[arg(value_name = "PATH")]
    pub input: PathBuf,
}

fn read_input(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read backup from stdin")?;
        return Ok(raw);
    }
    std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read backup {}", input.display()))
}

/// Execute `lanes import`.
///
/// Replaces the whole board with the backup. The document is validated
/// (including `"version": 1`) before anything is written; a rejected
/// document leaves the board untouched.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the document is invalid,
/// or the store rejects the replacement.
pub fn run_import(
    args: &ImportArgs,
    output: OutputMode,
    quiet: bool,
    project_root: &Path,
) -> Result<()> {
    let raw = read_input(&args.input)?;
    let (mut store, _) = open_board(output, project_root)?;

    let summary = match store.import_backup(&raw) {
        Ok(summary) => summary,
        Err(e) => return fail(output, &CliError::from(&e)),
    };
    settle(&mut store, output, quiet)?;

    render(output, &summary, |s, w| {
        pretty_kv(w, "projects", s.project_count.to_string())?;
        pretty_kv(w, "tasks", s.task_count.to_string())?;
        for count in &s.by_project {
            let title = store
                .project_by_id(&count.project_id)
                .map_or(count.project_id.as_str(), |p| p.title.as_str());
            writeln!(w, "  {title}: {}", count.tasks)?;
        }
        Ok(())
    })
}
