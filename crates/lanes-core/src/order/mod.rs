//! Ordered-collection position engine.
//!
//! Items carry a real-valued `position`; only relative order matters. Moves
//! compute a single new position for the moved item from its new neighbours,
//! so siblings are never rewritten.
//!
//! - [`position`]: arithmetic between neighbours and at the boundaries
//! - [`reorder`]: drag-and-drop moves inside a scoped bucket
//! - [`status`]: placement when a task changes completion bucket

pub mod position;
pub mod reorder;
pub mod status;

pub use position::{GAP, min_spacing, next_position, position_between, recalc_positions};
pub use reorder::{project_position_after_reorder, splice_move, task_position_after_reorder};
pub use status::{complete_task, position_for_status_change};

use crate::model::{Project, Task};

/// Anything that lives in an ordered collection.
pub trait Positioned {
    fn id(&self) -> &str;
    fn position(&self) -> f64;
}

impl Positioned for Project {
    fn id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> f64 {
        self.position
    }
}

impl Positioned for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> f64 {
        self.position
    }
}

/// Borrow `items` sorted ascending by position.
///
/// The sort is stable, so equal positions keep their insertion order.
pub fn sorted_by_position<'a, T: Positioned + 'a>(
    items: impl IntoIterator<Item = &'a T>,
) -> Vec<&'a T> {
    let mut ordered: Vec<&T> = items.into_iter().collect();
    ordered.sort_by(|a, b| a.position().total_cmp(&b.position()));
    ordered
}
