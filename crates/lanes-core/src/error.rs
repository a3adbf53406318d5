use std::fmt;

/// Machine-readable error codes for scripts and agents driving the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    ValidationFailed,
    UnsupportedVersion,
    ProjectNotFound,
    TaskNotFound,
    RemoteWriteFailed,
    RemoteUnavailable,
    CorruptStore,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::ValidationFailed => "E2001",
            Self::UnsupportedVersion => "E2002",
            Self::ProjectNotFound => "E2003",
            Self::TaskNotFound => "E2004",
            Self::RemoteWriteFailed => "E3001",
            Self::RemoteUnavailable => "E3002",
            Self::CorruptStore => "E3003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Board not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::ValidationFailed => "Invalid input",
            Self::UnsupportedVersion => "Unsupported backup version",
            Self::ProjectNotFound => "Project not found",
            Self::TaskNotFound => "Task not found",
            Self::RemoteWriteFailed => "Remote write failed",
            Self::RemoteUnavailable => "Remote store unavailable",
            Self::CorruptStore => "Corrupt SQLite store",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `lanes init` to create the board database."),
            Self::ConfigParseError => Some("Fix syntax in .lanes/config.toml and retry."),
            Self::ValidationFailed => Some("Titles must be non-empty; patches need at least one field."),
            Self::UnsupportedVersion => Some("Only backups with \"version\": 1 can be imported."),
            Self::ProjectNotFound | Self::TaskNotFound => Some("Run `lanes list` to see current ids."),
            Self::RemoteWriteFailed => {
                Some("Local changes were discarded and the board reloaded; repeat the action.")
            }
            Self::RemoteUnavailable => Some("The sync worker stopped; restart the command."),
            Self::CorruptStore => Some("Restore the board from an export with `lanes import`."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Input rejected before any state change.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{entity} title must not be empty")]
    EmptyTitle { entity: &'static str },

    #[error("update for {entity} '{id}' has no fields")]
    EmptyPatch { entity: &'static str, id: String },

    #[error("task '{id}' must have a completion time exactly when it is done")]
    CompletionMismatch { id: String },

    #[error("position must be a finite number, got {0}")]
    NonFinitePosition(f64),

    #[error("unsupported backup version {0} (expected 1)")]
    UnsupportedVersion(String),

    #[error("malformed backup: {0}")]
    Malformed(String),
}

impl ValidationError {
    /// Machine-readable code associated with this validation error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion(_) => ErrorCode::UnsupportedVersion,
            _ => ErrorCode::ValidationFailed,
        }
    }
}

/// Failure reported by a remote persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The store could not complete the write (I/O, constraint, lock).
    #[error("storage error: {0}")]
    Storage(String),

    /// The store refused the payload.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The sync worker is gone or the transport is down.
    #[error("remote unavailable: {0}")]
    Unavailable(String),
}

impl RemoteError {
    /// Machine-readable code associated with this remote error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Storage(_) | Self::Rejected(_) => ErrorCode::RemoteWriteFailed,
            Self::Unavailable(_) => ErrorCode::RemoteUnavailable,
        }
    }
}

/// Failure of a blocking store operation (load, import, export).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl StoreError {
    /// Machine-readable code associated with this store error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(err) => err.code(),
            Self::Remote(err) => err.code(),
        }
    }
}

impl From<anyhow::Error> for RemoteError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }
}
