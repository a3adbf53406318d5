use anyhow::{Context as _, Result};
use clap::Args;
use lanes_core::config::{LANES_DIR, load_project_config, write_default_project_config};
use lanes_core::db::SqliteRemote;
use lanes_core::db::migrations::current_schema_version;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use super::fail;
use crate::output::{CliError, OutputMode, pretty_kv, render};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Re-run initialization even if `.lanes/` already exists.
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "lanes.db\nlanes.db-wal\nlanes.db-shm\n";

#[derive(Debug, Serialize)]
struct InitReport {
    root: PathBuf,
    config: PathBuf,
    database: PathBuf,
    schema_version: u32,
}

/// Execute `lanes init`. Creates the board skeleton:
///
/// ```text
/// .lanes/
///   config.toml   (default project config)
///   lanes.db      (board database, migrated to the latest schema)
///   .gitignore    (database and WAL files)
/// ```
///
/// An existing config is left alone; `--force` re-applies migrations to an
/// existing board without touching its data.
///
/// # Errors
///
/// Returns an error if `.lanes/` already exists and `--force` is not set,
/// or if any filesystem or database operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let lanes_dir = project_root.join(LANES_DIR);
    if lanes_dir.exists() && !args.force {
        return fail(
            output,
            &CliError {
                message: format!("{} already exists", lanes_dir.display()),
                suggestion: Some("Use `lanes init --force` to reinitialize.".to_string()),
                error_code: None,
            },
        );
    }

    let config_path = write_default_project_config(project_root)?;
    let config = load_project_config(project_root)?;

    let gitignore = lanes_dir.join(".gitignore");
    if !gitignore.exists() {
        std::fs::write(&gitignore, GITIGNORE)
            .with_context(|| format!("Failed to write {}", gitignore.display()))?;
    }

    let database = config.database_path(project_root);
    let remote = SqliteRemote::open(&database)?;
    let schema_version = current_schema_version(remote.connection())?;
    info!(path = %database.display(), schema_version, "board initialized");

    let report = InitReport {
        root: project_root.to_path_buf(),
        config: config_path,
        database,
        schema_version,
    };
    render(output, &report, |r, w| {
        writeln!(w, "✓ Initialized board in {}", r.root.display())?;
        pretty_kv(w, "config", r.config.display().to_string())?;
        pretty_kv(w, "database", r.database.display().to_string())?;
        pretty_kv(w, "schema", format!("v{}", r.schema_version))
    })
}
