use super::Positioned;

/// Default spacing between neighbours when no tighter placement applies.
pub const GAP: f64 = 1000.0;

/// Position for an item appended after `ordered` (already sorted ascending).
#[must_use]
pub fn next_position<T: Positioned>(ordered: &[&T]) -> f64 {
    ordered.last().map_or(GAP, |last| last.position() + GAP)
}

/// Position strictly between two neighbours, or at a boundary.
///
/// | prev | next | result              |
/// |------|------|---------------------|
/// | -    | -    | `GAP`               |
/// | -    | n    | `n - GAP`           |
/// | p    | -    | `p + GAP`           |
/// | p    | n    | `p + (n - p) / 2`   |
///
/// A value before the first item may go negative. Repeated insertion between
/// the same neighbours halves the gap each time; nothing here rebalances.
#[must_use]
pub fn position_between(prev: Option<f64>, next: Option<f64>) -> f64 {
    match (prev, next) {
        (None, None) => GAP,
        (None, Some(next)) => next - GAP,
        (Some(prev), None) => prev + GAP,
        (Some(prev), Some(next)) => prev + (next - prev) / 2.0,
    }
}

/// Renumber a sequence to `GAP, 2*GAP, ...` in the given order.
#[must_use]
pub fn recalc_positions<T: Positioned>(ordered: &[&T]) -> Vec<(String, f64)> {
    ordered
        .iter()
        .zip(1_u32..)
        .map(|(item, rank)| (item.id().to_string(), f64::from(rank) * GAP))
        .collect()
}

/// Smallest distance between adjacent positions, or `None` for fewer than two.
#[must_use]
pub fn min_spacing(positions: &[f64]) -> Option<f64> {
    let mut sorted = positions.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .min_by(f64::total_cmp)
}
