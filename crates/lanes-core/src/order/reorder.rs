use tracing::debug;

use super::{Positioned, position_between, sorted_by_position};
use crate::model::{Project, Task};

/// Remove `active_id` from its slot and reinsert it at the slot `over_id`
/// held before the move (array splice semantics).
///
/// Returns `None` when either id is absent from `ordered`.
#[must_use]
pub fn splice_move<'a, T: Positioned>(
    ordered: &[&'a T],
    active_id: &str,
    over_id: &str,
) -> Option<Vec<&'a T>> {
    let active_index = ordered.iter().position(|item| item.id() == active_id)?;
    let over_index = ordered.iter().position(|item| item.id() == over_id)?;
    let mut updated = ordered.to_vec();
    let moved = updated.remove(active_index);
    updated.insert(over_index, moved);
    Some(updated)
}

fn position_after_move<T: Positioned>(ordered: &[&T], active_id: &str, over_id: &str) -> Option<f64> {
    if active_id == over_id {
        return None;
    }
    let reordered = splice_move(ordered, active_id, over_id)?;
    let index = reordered.iter().position(|item| item.id() == active_id)?;
    let prev = index
        .checked_sub(1)
        .and_then(|i| reordered.get(i))
        .map(|item| item.position());
    let next = reordered.get(index + 1).map(|item| item.position());
    Some(position_between(prev, next))
}

/// New position for task `active_id` dropped onto task `over_id`.
///
/// Returns `None` (no change) when either task is missing, when both ids are
/// the same, or when the two tasks are in different `(project, done)`
/// buckets. Only the moved task's position is computed; siblings keep theirs.
#[must_use]
pub fn task_position_after_reorder(tasks: &[Task], active_id: &str, over_id: &str) -> Option<f64> {
    let active = tasks.iter().find(|task| task.id == active_id)?;
    let over = tasks.iter().find(|task| task.id == over_id)?;
    if !active.same_bucket(over) {
        debug!(
            active = active_id,
            over = over_id,
            "rejecting cross-bucket task move"
        );
        return None;
    }
    let ordered = sorted_by_position(tasks.iter().filter(|task| task.same_bucket(active)));
    position_after_move(&ordered, active_id, over_id)
}

/// New position for project `active_id` dropped onto project `over_id`.
///
/// Projects form one flat order, so the only rejections are missing ids and
/// a self-move.
#[must_use]
pub fn project_position_after_reorder(
    projects: &[Project],
    active_id: &str,
    over_id: &str,
) -> Option<f64> {
    let ordered = sorted_by_position(projects);
    position_after_move(&ordered, active_id, over_id)
}

#[cfg(test)]
mod tests {
    use super::{project_position_after_reorder, splice_move, task_position_after_reorder};
    use crate::model::{Priority, Project, Task};
    use crate::order::{GAP, sorted_by_position};

    fn task(id: &str, project: &str, position: f64, done: bool) -> Task {
        Task {
            id: id.into(),
            project_id: project.into(),
            title: id.to_uppercase(),
            description: None,
            priority: Priority::Medium,
            done,
            position,
            created_at: 1,
            completed_at: done.then_some(5),
        }
    }

    fn project(id: &str, position: f64) -> Project {
        Project {
            id: id.into(),
            title: id.into(),
            position,
            created_at: 0,
        }
    }

    fn board() -> Vec<Task> {
        vec![
            task("t1", "p1", GAP, false),
            task("t2", "p1", GAP * 2.0, false),
            task("t3", "p2", GAP, false),
        ]
    }

    #[test]
    fn moving_first_onto_last_appends() {
        let tasks = board();
        let position = task_position_after_reorder(&tasks, "t1", "t2").expect("valid move");
        assert!((position - (2000.0 + GAP)).abs() < f64::EPSILON);
    }

    #[test]
    fn moving_last_onto_first_prepends() {
        let tasks = board();
        let position = task_position_after_reorder(&tasks, "t2", "t1").expect("valid move");
        assert!((position - (1000.0 - GAP)).abs() < f64::EPSILON);
    }

    #[test]
    fn moving_into_the_middle_takes_the_midpoint() {
        let mut tasks = board();
        tasks.push(task("t4", "p1", GAP * 3.0, false));
        // [t1, t2, t4] -> move t4 onto t2 -> [t1, t4, t2]
        let position = task_position_after_reorder(&tasks, "t4", "t2").expect("valid move");
        assert!((position - 1500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cross_project_moves_are_ignored() {
        assert_eq!(task_position_after_reorder(&board(), "t1", "t3"), None);
    }

    #[test]
    fn mixing_done_and_active_is_ignored() {
        let mut tasks = board();
        tasks.push(task("done", "p1", GAP * 5.0, true));
        assert_eq!(task_position_after_reorder(&tasks, "t2", "done"), None);
        assert_eq!(task_position_after_reorder(&tasks, "done", "t2"), None);
    }

    #[test]
    fn missing_or_identical_ids_are_no_change() {
        let tasks = board();
        assert_eq!(task_position_after_reorder(&tasks, "nope", "t1"), None);
        assert_eq!(task_position_after_reorder(&tasks, "t1", "nope"), None);
        assert_eq!(task_position_after_reorder(&tasks, "t1", "t1"), None);
    }

    #[test]
    fn done_bucket_reorders_independently() {
        let tasks = vec![
            task("a", "p1", 1000.0, false),
            task("d1", "p1", 5000.0, true),
            task("d2", "p1", 6000.0, true),
        ];
        let position = task_position_after_reorder(&tasks, "d2", "d1").expect("valid move");
        assert!((position - 4000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn splice_follows_array_semantics() {
        let a = project("a", 1.0);
        let b = project("b", 2.0);
        let c = project("c", 3.0);
        let ordered = vec![&a, &b, &c];
        let moved = splice_move(&ordered, "a", "c").expect("both present");
        let ids: Vec<&str> = moved.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
        assert!(splice_move(&ordered, "a", "z").is_none());
    }

    #[test]
    fn projects_reorder_in_flat_order_regardless_of_vec_order() {
        // Stored out of order on purpose; the engine sorts by position first.
        let projects = vec![project("c", 3000.0), project("a", 1000.0), project("b", 2000.0)];
        let position = project_position_after_reorder(&projects, "c", "a").expect("valid move");
        assert!((position - 0.0).abs() < f64::EPSILON);

        let ordered = sorted_by_position(&projects);
        assert_eq!(ordered[0].id, "a");
        assert_eq!(project_position_after_reorder(&projects, "a", "missing"), None);
    }
}
