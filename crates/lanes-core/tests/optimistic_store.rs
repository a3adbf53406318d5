//! Integration tests for the optimistic store against scripted remotes.
//!
//! Covers: local-first visibility, success merges, failure reloads,
//! quiet reload when an entity vanished, import validation, and the
//! replace-all / get-all round trip.

use lanes_core::error::{RemoteError, StoreError, ValidationError};
use lanes_core::model::{BoardData, Priority, Project, Task, TaskPatch};
use lanes_core::order::GAP;
use lanes_core::remote::{FaultPlan, MemoryRemote, Remote};
use lanes_core::snapshot::{ExportPayload, parse_backup};
use lanes_core::store::{BoardStore, NewTask, NoticeLevel};

fn project(id: &str, position: f64) -> Project {
    Project {
        id: id.to_string(),
        title: format!("Project {id}"),
        position,
        created_at: 1_700_000_000_000,
    }
}

fn task(id: &str, project_id: &str, position: f64) -> Task {
    Task {
        id: id.to_string(),
        project_id: project_id.to_string(),
        title: format!("Task {id}"),
        description: None,
        priority: Priority::Medium,
        done: false,
        position,
        created_at: 1_700_000_000_000,
        completed_at: None,
    }
}

fn seeded_remote() -> MemoryRemote {
    MemoryRemote::with_data(BoardData::new(
        vec![project("p1", 1000.0)],
        vec![task("t1", "p1", 1000.0), task("t2", "p1", 2000.0)],
    ))
}

fn open(remote: &MemoryRemote) -> BoardStore {
    BoardStore::open(remote.clone()).expect("open store")
}

fn position_of(store: &BoardStore, id: &str) -> f64 {
    store
        .board()
        .task_by_id(id)
        .map(|t| t.position)
        .expect("task exists")
}

// ===========================================================================
// Reorder
// ===========================================================================

#[test]
fn reorder_onto_last_task_appends() {
    let remote = seeded_remote();
    let mut store = open(&remote);

    assert!(store.reorder_tasks("t1", "t2"));
    // Visible before the remote has answered.
    assert!((position_of(&store, "t1") - (2000.0 + GAP)).abs() < f64::EPSILON);
    assert!((position_of(&store, "t2") - 2000.0).abs() < f64::EPSILON);
    let order: Vec<_> = store
        .visible_tasks("p1")
        .iter()
        .map(|t| t.id.clone())
        .collect();
    assert_eq!(order, ["t2", "t1"]);

    store.settle();
    let canonical = remote.snapshot().expect("snapshot");
    let t1 = canonical.tasks.iter().find(|t| t.id == "t1").expect("t1");
    assert!((t1.position - 3000.0).abs() < f64::EPSILON);
    assert!(store.take_notices().is_empty());
}

#[test]
fn invalid_reorder_sends_nothing() {
    let remote = seeded_remote();
    let mut store = open(&remote);
    let writes = remote.write_count().expect("count");

    assert!(!store.reorder_tasks("t1", "missing"));
    assert!(!store.reorder_tasks("t1", "t1"));
    assert_eq!(store.in_flight(), 0);
    assert_eq!(remote.write_count().expect("count"), writes);
}

// ===========================================================================
// Failure reload
// ===========================================================================

#[test]
fn failed_reorder_reloads_last_known_good_state() {
    let remote = seeded_remote();
    let mut store = open(&remote);
    remote.fail_next_writes(1).expect("inject");

    assert!(store.reorder_tasks("t1", "t2"));
    assert!((position_of(&store, "t1") - 3000.0).abs() < f64::EPSILON);

    store.settle();
    assert!((position_of(&store, "t1") - 1000.0).abs() < f64::EPSILON);
    assert_eq!(store.board().data(), remote.snapshot().expect("snapshot"));

    let notices = store.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, "Failed to reorder the task");
    assert_eq!(notices[0].code, Some("E3001"));
}

#[test]
fn failure_discards_optimistic_changes_queued_behind_it() {
    let remote = seeded_remote();
    let mut store = open(&remote);
    remote
        .set_faults(FaultPlan {
            offline_writes: true,
            ..FaultPlan::default()
        })
        .expect("faults");

    let id = store.add_project("Later").expect("valid title");
    store.toggle_task("t2");
    assert!(store.project_by_id(&id).is_some());

    store.settle();
    assert!(store.project_by_id(&id).is_none());
    assert!(!store.board().task_by_id("t2").expect("t2").done);
    assert_eq!(
        store
            .notices()
            .iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .count(),
        2
    );
}

#[test]
fn writes_landing_after_a_failure_reload_stay_visible() {
    let remote = seeded_remote();
    let mut store = open(&remote);
    remote.fail_next_writes(1).expect("inject");

    assert!(store.rename_project("p1", "Renamed").expect("valid"));
    let id = store.add_project("Queued").expect("valid");
    store.settle();

    let canonical = remote.snapshot().expect("snapshot");
    assert!(canonical.projects.iter().any(|p| p.id == id));
    assert!(store.project_by_id(&id).is_some());
    assert_eq!(store.project_by_id("p1").expect("p1").title, "Project p1");
    assert_eq!(store.board().data(), canonical);
    assert_eq!(store.in_flight(), 0);
}

#[test]
fn tasks_created_behind_a_failed_write_survive_settle() {
    let remote = seeded_remote();
    let mut store = open(&remote);
    remote.fail_next_writes(1).expect("inject");

    assert!(store.toggle_task("t1"));
    let id = store
        .add_task(NewTask {
            project_id: "p1".into(),
            title: "After failure".into(),
            ..NewTask::default()
        })
        .expect("valid")
        .expect("project exists");
    store.settle();

    assert!(store.board().task_by_id(&id).is_some());
    assert!(!store.board().task_by_id("t1").expect("t1").done);
    assert_eq!(store.board().data(), remote.snapshot().expect("snapshot"));
}

// ===========================================================================
// Success merges
// ===========================================================================

#[test]
fn created_entities_are_confirmed_with_notices() {
    let remote = seeded_remote();
    let mut store = open(&remote);

    let project_id = store.add_project("Backlog").expect("valid");
    let task_id = store
        .add_task(NewTask {
            project_id: project_id.clone(),
            title: "Draft plan".into(),
            description: Some("first pass".into()),
            priority: Priority::High,
        })
        .expect("valid")
        .expect("project exists");
    assert_eq!(store.last_used_project_id(), Some(project_id.as_str()));

    assert_eq!(store.settle(), 2);
    let messages: Vec<_> = store
        .take_notices()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(messages, ["Project created", "Task created"]);

    let canonical = remote.snapshot().expect("snapshot");
    let stored = canonical
        .tasks
        .iter()
        .find(|t| t.id == task_id)
        .expect("task persisted");
    assert!((stored.position - GAP).abs() < f64::EPSILON);
    assert_eq!(stored.description.as_deref(), Some("first pass"));
}

#[test]
fn toggle_round_trips_completion() {
    let remote = seeded_remote();
    let mut store = open(&remote);

    assert!(store.toggle_task("t1"));
    store.settle();
    let stored = remote.snapshot().expect("snapshot");
    let t1 = stored.tasks.iter().find(|t| t.id == "t1").expect("t1");
    assert!(t1.done);
    assert!(t1.completed_at.is_some());
    assert!(t1.position > 2000.0);

    assert!(store.toggle_task("t1"));
    store.settle();
    let stored = remote.snapshot().expect("snapshot");
    let t1 = stored.tasks.iter().find(|t| t.id == "t1").expect("t1");
    assert!(!t1.done);
    assert_eq!(t1.completed_at, None);
    assert!(t1.position < 2000.0);
}

#[test]
fn rapid_edits_keep_the_latest_local_value() {
    let remote = seeded_remote();
    let mut store = open(&remote);

    for title in ["one", "two", "three"] {
        let patch = TaskPatch {
            title: Some(title.into()),
            ..TaskPatch::default()
        };
        assert!(store.update_task("t1", patch).expect("valid"));
        store.pump();
    }
    store.settle();
    assert_eq!(store.board().task_by_id("t1").expect("t1").title, "three");
    assert_eq!(store.board().data(), remote.snapshot().expect("snapshot"));
}

#[test]
fn validation_errors_change_nothing() {
    let remote = seeded_remote();
    let mut store = open(&remote);
    let before = store.board().data();

    assert!(matches!(
        store.add_project(""),
        Err(ValidationError::EmptyTitle { .. })
    ));
    assert!(matches!(
        store.update_task("t1", TaskPatch::default()),
        Err(ValidationError::EmptyPatch { .. })
    ));
    assert!(!store.delete_task("ghost"));
    assert_eq!(store.board().data(), before);
    assert_eq!(store.in_flight(), 0);
}

#[test]
fn completion_time_cannot_contradict_done() {
    let remote = seeded_remote();
    let mut store = open(&remote);
    let before = remote.snapshot().expect("snapshot");

    let done_without_time = TaskPatch {
        done: Some(true),
        completed_at: Some(None),
        ..TaskPatch::default()
    };
    assert!(matches!(
        store.update_task("t1", done_without_time),
        Err(ValidationError::CompletionMismatch { .. })
    ));
    let time_without_done = TaskPatch {
        completed_at: Some(Some(1_700_000_000_000)),
        ..TaskPatch::default()
    };
    assert!(matches!(
        store.update_task("t2", time_without_done),
        Err(ValidationError::CompletionMismatch { .. })
    ));
    assert_eq!(store.in_flight(), 0);

    let done = TaskPatch {
        done: Some(true),
        ..TaskPatch::default()
    };
    assert!(store.update_task("t1", done).expect("valid"));
    store.settle();
    let stored = remote.snapshot().expect("snapshot");
    let t1 = stored.tasks.iter().find(|t| t.id == "t1").expect("t1");
    assert!(t1.done);
    assert!(t1.completed_at.is_some());
    assert_ne!(stored, before);
}

// ===========================================================================
// Remote-missing
// ===========================================================================

#[test]
fn update_of_remotely_deleted_task_reloads_quietly() {
    let mut remote = seeded_remote();
    let mut store = open(&remote);

    // Someone else removes t1 behind our back.
    remote.delete_task("t1").expect("delete");

    assert!(store.reorder_tasks("t1", "t2"));
    store.settle();
    assert!(store.board().task_by_id("t1").is_none());
    assert!(store.take_notices().is_empty());
}

// ===========================================================================
// Import / export
// ===========================================================================

#[test]
fn import_with_version_two_is_rejected_entirely() {
    let remote = seeded_remote();
    let mut store = open(&remote);
    let before = store.board().data();
    let writes = remote.write_count().expect("count");

    let raw = r#"{"version":2,"exportedAt":0,"projects":[],"tasks":[]}"#;
    let err = store.import_backup(raw).expect_err("must reject");
    assert!(matches!(
        &err,
        StoreError::Validation(ValidationError::UnsupportedVersion(version)) if version == "2"
    ));
    assert_eq!(err.code().code(), "E2002");
    assert_eq!(store.board().data(), before);
    assert_eq!(remote.snapshot().expect("snapshot"), before);
    assert_eq!(remote.write_count().expect("count"), writes);
}

#[test]
fn export_then_import_restores_exact_state() {
    let remote = seeded_remote();
    let mut store = open(&remote);
    store.reorder_tasks("t2", "t1");
    let backup = store.export_backup().expect("export");

    store.delete_project("p1");
    store.settle();
    assert!(store.board().projects().is_empty());

    let summary = store.import_backup(&backup).expect("import");
    assert_eq!(summary.project_count, 1);
    assert_eq!(summary.task_count, 2);
    assert_eq!(
        store.board().data().sorted_by_id(),
        parse_backup(&backup).expect("parse").into_board().sorted_by_id()
    );
    assert_eq!(store.last_used_project_id(), Some("p1"));
    assert!(
        store
            .notices()
            .iter()
            .any(|n| n.message == "Backup imported")
    );
}

#[test]
fn failed_import_keeps_previous_remote_contents() {
    let remote = seeded_remote();
    let mut store = open(&remote);
    remote.fail_next_writes(1).expect("inject");

    let payload = ExportPayload::from_board(BoardData::new(vec![project("p9", 1.0)], vec![]));
    let raw = payload.to_json_pretty().expect("serialize");
    let err = store.import_backup(&raw).expect_err("remote fails");
    assert!(matches!(err, StoreError::Remote(RemoteError::Storage(_))));
    assert!(store.project_by_id("p1").is_some());
    assert!(store.project_by_id("p9").is_none());
}

#[test]
fn replace_all_then_get_all_returns_supplied_records() {
    let mut remote = MemoryRemote::new();
    let mut described = task("t1", "p1", 1234.5678);
    described.description = Some("keep me".into());
    described.done = true;
    described.completed_at = Some(1_700_000_000_999);
    let data = BoardData::new(
        vec![project("p1", 0.125), project("p2", -3.0)],
        vec![described, task("t2", "p2", 1e-9)],
    );

    let stored = remote.replace_all(data.clone()).expect("replace");
    assert_eq!(stored, data);
    assert_eq!(remote.get_all().expect("get_all"), data);
}

// ===========================================================================
// Load
// ===========================================================================

#[test]
fn load_failure_leaves_board_not_ready() {
    let remote = seeded_remote();
    remote
        .set_faults(FaultPlan {
            offline_reads: true,
            ..FaultPlan::default()
        })
        .expect("faults");

    let mut store = BoardStore::new(remote.clone()).expect("spawn");
    assert!(store.load().is_err());
    assert!(!store.board().is_ready());
    assert_eq!(store.notices().len(), 1);

    remote.set_faults(FaultPlan::default()).expect("faults");
    store.load().expect("load");
    assert!(store.board().is_ready());
    assert_eq!(store.last_used_project_id(), Some("p1"));
}

#[test]
fn dropping_the_store_drains_queued_writes() {
    let remote = seeded_remote();
    {
        let mut store = open(&remote);
        store.add_project("Queued").expect("valid");
        store.delete_task("t1");
    }
    let canonical = remote.snapshot().expect("snapshot");
    assert_eq!(canonical.projects.len(), 2);
    assert!(canonical.tasks.iter().all(|t| t.id != "t1"));
}
