use anyhow::{Context as _, Result};
use clap::Args;
use lanes_core::snapshot::{ExportSummary, summarize_export};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{fail, fail_validation, open_board};
use crate::output::{CliError, OutputMode, pretty_kv, render};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Write the backup to this file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportReport {
    path: PathBuf,
    exported_at: i64,
    #[serde(flatten)]
    summary: ExportSummary,
}

/// Execute `lanes export`.
///
/// Without `--output` the backup document itself is the command's output
/// (in every mode). With `--output` the document goes to the file and a
/// summary is printed instead.
///
/// # Errors
///
/// Returns an error if the board cannot be read or the file cannot be written.
pub fn run_export(args: &ExportArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let (mut store, _) = open_board(output, project_root)?;
    let payload = match store.export_payload() {
        Ok(payload) => payload,
        Err(e) => return fail(output, &CliError::from_code(e.code(), e.to_string())),
    };
    let json = match payload.to_json_pretty() {
        Ok(json) => json,
        Err(e) => return fail_validation(output, &e),
    };
    let summary = summarize_export(&payload.projects, &payload.tasks);
    info!(
        projects = summary.project_count,
        tasks = summary.task_count,
        "board exported"
    );

    let Some(path) = &args.output else {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{json}")?;
        return Ok(());
    };

    std::fs::write(path, format!("{json}\n"))
        .with_context(|| format!("Failed to write backup to {}", path.display()))?;

    let report = ExportReport {
        path: path.clone(),
        exported_at: payload.exported_at,
        summary,
    };
    render(output, &report, |r, w| {
        writeln!(w, "✓ Exported board to {}", r.path.display())?;
        pretty_kv(w, "projects", r.summary.project_count.to_string())?;
        pretty_kv(w, "tasks", r.summary.task_count.to_string())
    })
}
