//! Optimistic board store.
//!
//! Every mutation is applied to the local [`Board`] first and is visible
//! immediately; the mirroring write is queued on the sync worker and never
//! blocks the caller. Completed writes are folded back in by [`BoardStore::pump`]
//! (non-blocking) or [`BoardStore::settle`] (waits for everything queued):
//!
//! - success: the canonical record replaces the local one by id, unless a
//!   newer local mutation of the same entity has happened since
//! - failure: local state is discarded, the board is reloaded from the
//!   remote, and an error [`Notice`] is queued; nothing is retried
//! - the entity vanished remotely: quiet reload, no notice
//!
//! A reload taken while later writes are still queued can miss their
//! effects, so the store reloads once more when the queue drains.

pub mod board;
pub mod notice;
pub mod worker;

pub use board::{Board, Dispatch, Intent, NewTask, RemoteOp};
pub use notice::{Notice, NoticeLevel};
pub use worker::{Outcome, Reply};

use tracing::{debug, info, warn};

use crate::error::{RemoteError, StoreError, ValidationError};
use crate::filter::FilterUpdate;
use crate::model::{Project, Task, TaskPatch};
use crate::order::min_spacing;
use crate::remote::Remote;
use crate::snapshot::{ExportPayload, ExportSummary, parse_backup, summarize_export};
use worker::{Call, Job, SyncWorker};

/// Result of [`BoardStore::renumber_tasks`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenumberReport {
    /// Tasks whose position changed.
    pub moved: usize,
    /// Tightest spacing in the bucket before renumbering.
    pub min_spacing_before: Option<f64>,
}

/// Session owner of the board and its sync worker.
pub struct BoardStore {
    board: Board,
    worker: SyncWorker,
    in_flight: usize,
    resync: bool,
    notices: Vec<Notice>,
}

impl BoardStore {
    /// Start a sync worker around `remote`. The board starts empty and not
    /// ready; call [`Self::load`] next.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Unavailable`] if the worker thread cannot start.
    pub fn new<R>(remote: R) -> Result<Self, RemoteError>
    where
        R: Remote + Send + 'static,
    {
        Ok(Self {
            board: Board::new(),
            worker: SyncWorker::spawn(remote)?,
            in_flight: 0,
            resync: false,
            notices: Vec::new(),
        })
    }

    /// [`Self::new`] followed by [`Self::load`].
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the worker cannot start or the initial load fails.
    pub fn open<R>(remote: R) -> Result<Self, RemoteError>
    where
        R: Remote + Send + 'static,
    {
        let mut store = Self::new(remote)?;
        store.load()?;
        Ok(store)
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Writes queued but not yet reconciled.
    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Replace the board wholesale with the remote's contents.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the remote cannot be read; the board is
    /// left as it was and an error notice is queued.
    pub fn load(&mut self) -> Result<(), RemoteError> {
        self.settle();
        match self.worker.call(Call::GetAll) {
            Ok(data) => {
                info!(
                    projects = data.projects.len(),
                    tasks = data.tasks.len(),
                    "board loaded"
                );
                self.board.load(data);
                Ok(())
            }
            Err(error) => {
                warn!("board load failed: {error}");
                self.notices.push(Notice::error(
                    "Could not load the board",
                    error.code(),
                    error.to_string(),
                ));
                Err(error)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    fn dispatch(&mut self, dispatch: Dispatch) {
        let intent = dispatch.intent;
        match self.worker.submit(Job::Write(dispatch)) {
            Ok(()) => self.in_flight += 1,
            Err(error) => {
                warn!(?intent, "could not queue remote write: {error}");
                self.notices.push(Notice::error(
                    intent.failure_message(),
                    error.code(),
                    error.to_string(),
                ));
            }
        }
    }

    fn dispatch_opt(&mut self, dispatch: Option<Dispatch>) -> bool {
        let Some(dispatch) = dispatch else {
            return false;
        };
        self.dispatch(dispatch);
        true
    }

    /// Create a project at the end of the board and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty title.
    pub fn add_project(&mut self, title: &str) -> Result<String, ValidationError> {
        let dispatch = self.board.add_project(title)?;
        let id = dispatch.op.subject().to_string();
        self.dispatch(dispatch);
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty title.
    pub fn rename_project(&mut self, id: &str, title: &str) -> Result<bool, ValidationError> {
        let dispatch = self.board.rename_project(id, title)?;
        Ok(self.dispatch_opt(dispatch))
    }

    pub fn delete_project(&mut self, id: &str) -> bool {
        let dispatch = self.board.delete_project(id);
        self.dispatch_opt(dispatch)
    }

    pub fn reorder_projects(&mut self, active_id: &str, over_id: &str) -> bool {
        let dispatch = self.board.reorder_projects(active_id, over_id);
        self.dispatch_opt(dispatch)
    }

    /// Create a task at the end of its project and return its id, or `None`
    /// if the project is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty title.
    pub fn add_task(&mut self, input: NewTask) -> Result<Option<String>, ValidationError> {
        let Some(dispatch) = self.board.add_task(input)? else {
            return Ok(None);
        };
        let id = dispatch.op.subject().to_string();
        self.dispatch(dispatch);
        Ok(Some(id))
    }

    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty patch or an empty title.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<bool, ValidationError> {
        let dispatch = self.board.update_task(id, patch)?;
        Ok(self.dispatch_opt(dispatch))
    }

    pub fn delete_task(&mut self, id: &str) -> bool {
        let dispatch = self.board.delete_task(id);
        self.dispatch_opt(dispatch)
    }

    pub fn reorder_tasks(&mut self, active_id: &str, over_id: &str) -> bool {
        let dispatch = self.board.reorder_tasks(active_id, over_id);
        self.dispatch_opt(dispatch)
    }

    pub fn toggle_task(&mut self, id: &str) -> bool {
        let dispatch = self.board.toggle_task(id);
        self.dispatch_opt(dispatch)
    }

    /// Respace one bucket of a project to multiples of `GAP`.
    pub fn renumber_tasks(&mut self, project_id: &str, done: bool) -> RenumberReport {
        let before: Vec<f64> = self
            .board
            .tasks()
            .iter()
            .filter(|task| task.project_id == project_id && task.done == done)
            .map(|task| task.position)
            .collect();
        let min_spacing_before = min_spacing(&before);

        let dispatches = self.board.renumber_tasks(project_id, done);
        let moved = dispatches.len();
        for dispatch in dispatches {
            self.dispatch(dispatch);
        }
        info!(project_id, done, moved, ?min_spacing_before, "renumbered bucket");
        RenumberReport {
            moved,
            min_spacing_before,
        }
    }

    // -----------------------------------------------------------------------
    // View state
    // -----------------------------------------------------------------------

    pub fn set_filters(&mut self, update: FilterUpdate) {
        self.board.set_filters(update);
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.board.set_search_query(query);
    }

    pub fn select_task(&mut self, id: Option<&str>) -> bool {
        self.board.select_task(id)
    }

    #[must_use]
    pub fn last_used_project_id(&self) -> Option<&str> {
        self.board.last_used_project_id()
    }

    #[must_use]
    pub fn visible_tasks(&self, project_id: &str) -> Vec<&Task> {
        self.board.visible_tasks(project_id)
    }

    #[must_use]
    pub fn project_by_id(&self, id: &str) -> Option<&Project> {
        self.board.project_by_id(id)
    }

    // -----------------------------------------------------------------------
    // Backup
    // -----------------------------------------------------------------------

    /// Canonical remote state stamped as a backup document.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the remote cannot be read.
    pub fn export_payload(&mut self) -> Result<ExportPayload, RemoteError> {
        self.settle();
        self.worker.call(Call::GetAll).map(ExportPayload::from_board)
    }

    /// Pretty JSON backup of the remote's canonical state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the remote cannot be read.
    pub fn export_backup(&mut self) -> Result<String, StoreError> {
        Ok(self.export_payload()?.to_json_pretty()?)
    }

    /// Validate `raw`, replace the remote board with it, and adopt the
    /// stored result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] before anything changes when the
    /// document is invalid, or [`StoreError::Remote`] when the replacement
    /// fails (the board is then reloaded).
    pub fn import_backup(&mut self, raw: &str) -> Result<ExportSummary, StoreError> {
        let payload = parse_backup(raw)?;
        self.settle();

        match self.worker.call(Call::ReplaceAll(payload.into_board())) {
            Ok(stored) => {
                let summary = summarize_export(&stored.projects, &stored.tasks);
                info!(
                    projects = summary.project_count,
                    tasks = summary.task_count,
                    "backup imported"
                );
                self.board.load(stored);
                self.notices.push(Notice::success("Backup imported"));
                Ok(summary)
            }
            Err(error) => {
                warn!("import failed: {error}");
                if let Ok(data) = self.worker.call(Call::GetAll) {
                    self.board.reload(data);
                }
                self.notices.push(Notice::error(
                    "Could not import the backup",
                    error.code(),
                    error.to_string(),
                ));
                Err(error.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Reconciliation
    // -----------------------------------------------------------------------

    fn absorb(&mut self, reply: Reply) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let reloaded = matches!(reply.outcome, Outcome::Failed { .. } | Outcome::Vanished(_));
        if let Some(notice) = self.board.reconcile(reply) {
            self.notices.push(notice);
        }
        if reloaded && self.in_flight > 0 {
            self.resync = true;
        }
        if self.in_flight == 0 && self.resync {
            self.resync_after_drain();
        }
    }

    /// Reload once the queue is empty so writes that landed after an
    /// earlier reload are reflected locally.
    fn resync_after_drain(&mut self) {
        self.resync = false;
        match self.worker.call(Call::GetAll) {
            Ok(data) => {
                debug!(
                    projects = data.projects.len(),
                    tasks = data.tasks.len(),
                    "resynced after drained queue"
                );
                self.board.reload(data);
            }
            Err(error) => warn!("resync after drained queue failed: {error}"),
        }
    }

    /// Fold in every write that has already completed. Never blocks.
    ///
    /// Returns the number of replies processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Some(reply) = self.worker.try_reply() {
            self.absorb(reply);
            processed += 1;
        }
        processed
    }

    /// Block until every queued write has been reconciled.
    ///
    /// Returns the number of replies processed.
    pub fn settle(&mut self) -> usize {
        let mut processed = 0;
        while self.in_flight > 0 {
            match self.worker.wait_reply() {
                Ok(reply) => {
                    self.absorb(reply);
                    processed += 1;
                }
                Err(error) => {
                    warn!(pending = self.in_flight, "sync worker gone: {error}");
                    self.in_flight = 0;
                    self.resync = false;
                    self.notices.push(Notice::error(
                        "Pending changes were not saved",
                        error.code(),
                        error.to_string(),
                    ));
                }
            }
        }
        processed
    }

    // -----------------------------------------------------------------------
    // Notices
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl std::fmt::Debug for BoardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardStore")
            .field("board", &self.board)
            .field("in_flight", &self.in_flight)
            .field("resync", &self.resync)
            .field("notices", &self.notices)
            .finish_non_exhaustive()
    }
}
