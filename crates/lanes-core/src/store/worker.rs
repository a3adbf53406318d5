//! Background sync worker.
//!
//! The worker thread owns the [`Remote`] and processes jobs strictly in the
//! order they were queued. A failed write is answered with a fresh
//! `get_all` snapshot so the store can reload without another round trip.
//!
//! ```text
//!   BoardStore            mpsc<Job>           worker thread
//!   ┌──────────────┐   ─────────────▶   ┌───────────────────┐
//!   │ apply local  │                    │ Box<dyn Remote>   │
//!   │ reconcile    │   ◀─────────────   │ FIFO, no retries  │
//!   └──────────────┘    mpsc<Reply>     └───────────────────┘
//! ```

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use tracing::{debug, trace, warn};

use super::board::{Dispatch, Intent, RemoteOp};
use crate::error::RemoteError;
use crate::model::{BoardData, Project, Task};
use crate::remote::Remote;

/// Synchronous request answered on its own channel.
#[derive(Debug)]
pub enum Call {
    GetAll,
    ReplaceAll(BoardData),
}

pub(crate) enum Job {
    Write(Dispatch),
    Call {
        call: Call,
        reply: Sender<Result<BoardData, RemoteError>>,
    },
}

/// What the remote made of one write.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Project(Project),
    Task(Task),
    Deleted,
    /// The update target no longer exists remotely; carries a reload.
    Vanished(Result<BoardData, RemoteError>),
    /// The write failed; carries a reload taken right after the failure.
    Failed {
        error: RemoteError,
        reload: Result<BoardData, RemoteError>,
    },
}

/// Result of one [`Dispatch`], sent back to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub token: u64,
    pub subject: String,
    pub intent: Intent,
    pub outcome: Outcome,
}

pub(crate) struct SyncWorker {
    jobs: Option<Sender<Job>>,
    replies: Receiver<Reply>,
    handle: Option<JoinHandle<()>>,
}

impl SyncWorker {
    /// Spawn the worker thread around `remote`.
    pub(crate) fn spawn<R>(remote: R) -> Result<Self, RemoteError>
    where
        R: Remote + Send + 'static,
    {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (reply_tx, reply_rx) = mpsc::channel::<Reply>();
        let handle = std::thread::Builder::new()
            .name("lanes-sync".into())
            .spawn(move || run(remote, &job_rx, &reply_tx))
            .map_err(|e| RemoteError::Unavailable(format!("spawn sync worker: {e}")))?;
        Ok(Self {
            jobs: Some(job_tx),
            replies: reply_rx,
            handle: Some(handle),
        })
    }

    pub(crate) fn submit(&self, job: Job) -> Result<(), RemoteError> {
        self.jobs
            .as_ref()
            .ok_or_else(|| RemoteError::Unavailable("sync worker closed".into()))?
            .send(job)
            .map_err(|_| RemoteError::Unavailable("sync worker stopped".into()))
    }

    /// Blocking request/response through the same FIFO as writes.
    pub(crate) fn call(&self, call: Call) -> Result<BoardData, RemoteError> {
        let (tx, rx) = mpsc::channel();
        self.submit(Job::Call { call, reply: tx })?;
        rx.recv()
            .map_err(|_| RemoteError::Unavailable("sync worker dropped the request".into()))?
    }

    pub(crate) fn try_reply(&self) -> Option<Reply> {
        self.replies.try_recv().ok()
    }

    pub(crate) fn wait_reply(&self) -> Result<Reply, RemoteError> {
        self.replies
            .recv()
            .map_err(|_| RemoteError::Unavailable("sync worker stopped".into()))
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        // Closing the queue lets the worker drain what is left, then exit.
        drop(self.jobs.take());
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("sync worker panicked");
        }
    }
}

fn run<R: Remote>(mut remote: R, jobs: &Receiver<Job>, replies: &Sender<Reply>) {
    debug!("sync worker started");
    while let Ok(job) = jobs.recv() {
        match job {
            Job::Write(dispatch) => {
                let reply = execute(&mut remote, dispatch);
                if replies.send(reply).is_err() {
                    trace!("store gone; dropping reply");
                }
            }
            Job::Call { call, reply } => {
                let result = match call {
                    Call::GetAll => remote.get_all(),
                    Call::ReplaceAll(data) => remote.replace_all(data),
                };
                let _ = reply.send(result);
            }
        }
    }
    debug!("sync worker stopped");
}

fn execute<R: Remote>(remote: &mut R, dispatch: Dispatch) -> Reply {
    let Dispatch {
        token,
        intent,
        op,
    } = dispatch;
    let subject = op.subject().to_string();
    trace!(token, %subject, ?intent, "remote write");

    let result = match op {
        RemoteOp::CreateProject(project) => remote.create_project(project).map(Outcome::Project),
        RemoteOp::UpdateProject { id, patch } => remote
            .update_project(&id, &patch)
            .map(|found| found.map_or_else(|| Outcome::Vanished(remote.get_all()), Outcome::Project)),
        RemoteOp::DeleteProject(id) => remote.delete_project(&id).map(|()| Outcome::Deleted),
        RemoteOp::CreateTask(task) => remote.create_task(task).map(Outcome::Task),
        RemoteOp::UpdateTask { id, patch } => remote
            .update_task(&id, &patch)
            .map(|found| found.map_or_else(|| Outcome::Vanished(remote.get_all()), Outcome::Task)),
        RemoteOp::DeleteTask(id) => remote.delete_task(&id).map(|()| Outcome::Deleted),
    };

    let outcome = result.unwrap_or_else(|error| {
        warn!(token, %subject, ?intent, "remote write failed: {error}");
        Outcome::Failed {
            error,
            reload: remote.get_all(),
        }
    });

    Reply {
        token,
        subject,
        intent,
        outcome,
    }
}
