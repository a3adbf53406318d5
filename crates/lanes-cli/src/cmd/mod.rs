//! Command handlers. Each submodule exposes an `XArgs` clap struct and a
//! `run_x` entry point; this module holds the plumbing they share.

pub mod completions;
pub mod export;
pub mod import;
pub mod init;
pub mod list;
pub mod project;
pub mod task;

use anyhow::Result;
use lanes_core::config::{LANES_DIR, ProjectConfig, load_project_config};
use lanes_core::db::SqliteRemote;
use lanes_core::db::query::try_open_store;
use lanes_core::error::{ErrorCode, ValidationError};
use lanes_core::store::BoardStore;
use std::path::Path;
use tracing::debug;

use crate::output::{CliError, OutputMode, render_error, render_notice};

/// Render `error` and turn it into the command's failure.
pub fn fail<T>(output: OutputMode, error: &CliError) -> Result<T> {
    render_error(output, error)?;
    anyhow::bail!("{}", error.message)
}

/// Fail with a validation error raised before anything changed.
pub fn fail_validation<T>(output: OutputMode, error: &ValidationError) -> Result<T> {
    fail(output, &CliError::from(error))
}

/// Open the board rooted at `project_root` and load it.
///
/// # Errors
///
/// Renders and returns an error if the board is not initialized, the
/// config is invalid, or the database cannot be read.
pub fn open_board(output: OutputMode, project_root: &Path) -> Result<(BoardStore, ProjectConfig)> {
    let config = match load_project_config(project_root) {
        Ok(config) => config,
        Err(e) => {
            return fail(
                output,
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{e:#}")),
            );
        }
    };

    let db_path = config.database_path(project_root);
    if !project_root.join(LANES_DIR).is_dir() || try_open_store(&db_path)?.is_none() {
        return fail(
            output,
            &CliError::from_code(
                ErrorCode::NotInitialized,
                format!("no board database at {}", db_path.display()),
            ),
        );
    }

    let remote = match SqliteRemote::open(&db_path) {
        Ok(remote) => remote,
        Err(e) => {
            return fail(
                output,
                &CliError::from_code(ErrorCode::CorruptStore, format!("{e:#}")),
            );
        }
    };
    debug!(path = %db_path.display(), "board database opened");

    match BoardStore::open(remote) {
        Ok(store) => Ok((store, config)),
        Err(e) => fail(output, &CliError::from_code(e.code(), e.to_string())),
    }
}

/// Wait for queued writes, echo success notices, and fail on the first
/// error notice.
///
/// # Errors
///
/// Returns an error if any write was rejected by the store.
pub fn settle(store: &mut BoardStore, output: OutputMode, quiet: bool) -> Result<()> {
    store.settle();
    let notices = store.take_notices();
    if let Some(error) = notices.iter().find(|notice| notice.is_error()) {
        return fail(output, &CliError::from(error));
    }
    if !quiet {
        for notice in &notices {
            render_notice(output, notice)?;
        }
    }
    Ok(())
}

/// How an id argument matched.
#[derive(Debug, PartialEq, Eq)]
enum IdMatch<'a> {
    Exact(&'a str),
    Prefix(&'a str),
    Ambiguous(usize),
    Missing,
}

fn match_id<'a>(ids: impl Iterator<Item = &'a str>, raw: &str) -> IdMatch<'a> {
    if raw.is_empty() {
        return IdMatch::Missing;
    }
    let mut found = None;
    let mut prefixed = 0;
    for id in ids {
        if id == raw {
            return IdMatch::Exact(id);
        }
        if id.starts_with(raw) {
            prefixed += 1;
            found = Some(id);
        }
    }
    match (prefixed, found) {
        (1, Some(id)) => IdMatch::Prefix(id),
        (0, _) | (_, None) => IdMatch::Missing,
        (n, Some(_)) => IdMatch::Ambiguous(n),
    }
}

fn resolve_id<'a>(
    output: OutputMode,
    ids: impl Iterator<Item = &'a str>,
    raw: &str,
    entity: &str,
    missing: ErrorCode,
) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return fail(
            output,
            &CliError::from_code(
                ErrorCode::ValidationFailed,
                format!("{entity} id must not be empty"),
            ),
        );
    }
    match match_id(ids, trimmed) {
        IdMatch::Exact(id) | IdMatch::Prefix(id) => Ok(id.to_string()),
        IdMatch::Ambiguous(n) => fail(
            output,
            &CliError::from_code(
                ErrorCode::ValidationFailed,
                format!("{entity} id prefix '{raw}' matches {n} {entity}s; use more characters"),
            ),
        ),
        IdMatch::Missing => fail(
            output,
            &CliError::from_code(missing, format!("{entity} '{raw}' not found")),
        ),
    }
}

/// Resolve a project id, accepting any unique prefix.
///
/// # Errors
///
/// Renders and returns an error if no project or several projects match.
pub fn resolve_project(store: &BoardStore, output: OutputMode, raw: &str) -> Result<String> {
    let ids = store.board().projects().iter().map(|p| p.id.as_str());
    resolve_id(output, ids, raw, "project", ErrorCode::ProjectNotFound)
}

/// Resolve a task id, accepting any unique prefix.
///
/// # Errors
///
/// Renders and returns an error if no task or several tasks match.
pub fn resolve_task(store: &BoardStore, output: OutputMode, raw: &str) -> Result<String> {
    let ids = store.board().tasks().iter().map(|t| t.id.as_str());
    resolve_id(output, ids, raw, "task", ErrorCode::TaskNotFound)
}
