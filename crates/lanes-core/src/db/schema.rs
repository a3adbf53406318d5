//! Canonical SQLite schema for the board store.
//!
//! - `projects` holds board columns ordered by `position`
//! - `tasks` holds cards; `position` is only meaningful inside
//!   `(project_id, done)`, and deleting a project cascades to its tasks
//! - `board_meta` mirrors the schema version for external tools

/// Migration v1: core tables plus board metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS projects (
    project_id TEXT PRIMARY KEY,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    position REAL NOT NULL,
    created_at_ms INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    task_id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT,
    priority TEXT NOT NULL CHECK (priority IN ('low', 'medium', 'high')),
    done INTEGER NOT NULL DEFAULT 0 CHECK (done IN (0, 1)),
    position REAL NOT NULL,
    created_at_ms INTEGER NOT NULL,
    completed_at_ms INTEGER
);

CREATE TABLE IF NOT EXISTS board_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO board_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: read-path indexes for ordered listing.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_projects_position
    ON projects(position);

CREATE INDEX IF NOT EXISTS idx_tasks_project_position
    ON tasks(project_id, position);

CREATE INDEX IF NOT EXISTS idx_tasks_bucket_position
    ON tasks(project_id, done, position);
";

/// Indexes every migrated database must carry.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_projects_position",
    "idx_tasks_project_position",
    "idx_tasks_bucket_position",
];
