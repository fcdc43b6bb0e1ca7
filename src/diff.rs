//! Change-set computation over row snapshots
//!
//! Pure functions comparing positionally aligned before/after snapshots.
//! Row `i` of the before array is always compared against row `i` of the
//! after array; rows are never matched by primary key, so a result set that
//! was reordered between the two snapshots will pair unrelated rows.

use crate::model::row::Row;
use std::collections::BTreeSet;

/// Compute the set of relevant columns whose value differs in at least one
/// aligned before/after row pair.
///
/// Iterates `0..max(before.len(), after.len())`; indices where either side
/// is absent are skipped, not treated as changes. Comparison is strict value
/// equality with no type coercion.
pub fn compute_change_set(
    before: &[Row],
    after: &[Row],
    relevant: &[String],
) -> BTreeSet<String> {
    let mut changed = BTreeSet::new();
    let len = before.len().max(after.len());

    for i in 0..len {
        let (Some(b), Some(a)) = (before.get(i), after.get(i)) else {
            continue;
        };
        for column in relevant {
            if changed.contains(column) {
                continue;
            }
            if b.get(column) != a.get(column) {
                changed.insert(column.clone());
            }
        }
    }

    changed
}

/// Number of relevant columns that differ somewhere across the snapshots.
///
/// Zero means the update is a no-op and the preview/action UI should be
/// suppressed entirely.
pub fn count_changed_fields(before: &[Row], after: &[Row], relevant: &[String]) -> usize {
    compute_change_set(before, after, relevant).len()
}
