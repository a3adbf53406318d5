use super::{GAP, position_between, sorted_by_position};
use crate::model::{Task, now_ms};

/// Return a copy of `task` with its completion flag set to `done`.
///
/// Marking done stamps `completed_at` with the current time; reactivating
/// clears it.
#[must_use]
pub fn complete_task(task: &Task, done: bool) -> Task {
    Task {
        done,
        completed_at: done.then(now_ms),
        ..task.clone()
    }
}

/// Position `task` should take after its `done` flag flips to `done`.
///
/// The old numeric position is meaningless in the new bucket, so it is
/// recomputed against the task's siblings in the same project:
/// - to done: after the last sibling of either bucket
/// - to active: before the first active sibling
/// - no siblings, or no active sibling to land before: `GAP`
#[must_use]
pub fn position_for_status_change(tasks: &[Task], task: &Task, done: bool) -> f64 {
    let siblings = sorted_by_position(
        tasks
            .iter()
            .filter(|item| item.project_id == task.project_id && item.id != task.id),
    );
    let Some(last) = siblings.last() else {
        return GAP;
    };
    if done {
        return last.position + GAP;
    }
    siblings
        .iter()
        .find(|item| !item.done)
        .map_or(GAP, |first_active| {
            position_between(None, Some(first_active.position))
        })
}
