use std::collections::HashSet;

use tracing::debug;

use crate::task::TaskId;

/// Maps a drag result back onto the canonical order.
///
/// `visible_new_order` is the currently rendered subset (one page of a
/// possibly filtered view) in its new visual order. The visible tasks are
/// reassigned into the slots that subset occupied in `full_order`; hidden
/// and off-page tasks keep their positions. The result is always handed to
/// `TaskStore::reorder`, whose permutation check rejects any id that was
/// not actually in the store.
pub fn reconcile(full_order: &[TaskId], visible_new_order: &[TaskId]) -> Vec<TaskId> {
    let visible: HashSet<&TaskId> = visible_new_order.iter().collect();
    let mut replacements = visible_new_order.iter();

    let next = full_order
        .iter()
        .map(|id| {
            if visible.contains(id) {
                replacements.next().unwrap_or(id).clone()
            } else {
                id.clone()
            }
        })
        .collect();

    debug!(
        full = full_order.len(),
        visible = visible_new_order.len(),
        "reconciled visible order into canonical order"
    );
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<TaskId> {
        raw.iter().map(|s| TaskId::from(*s)).collect()
    }

    #[test]
    fn full_view_reorder_is_taken_verbatim() {
        let full = ids(&["a", "b", "c"]);
        let dragged = ids(&["b", "a", "c"]);
        assert_eq!(reconcile(&full, &dragged), dragged);
    }

    #[test]
    fn hidden_tasks_keep_their_slots() {
        // b and d are filtered out of view; a and c swap places
        let full = ids(&["a", "b", "c", "d"]);
        let dragged = ids(&["c", "a"]);
        assert_eq!(reconcile(&full, &dragged), ids(&["c", "b", "a", "d"]));
    }

    #[test]
    fn off_page_prefix_and_suffix_are_untouched() {
        let full = ids(&["a", "b", "c", "d", "e", "f"]);
        let dragged = ids(&["d", "c", "e"]);
        assert_eq!(
            reconcile(&full, &dragged),
            ids(&["a", "b", "d", "c", "e", "f"])
        );
    }

    #[test]
    fn stale_visible_ids_produce_a_non_permutation() {
        // "x" never was in the store; it consumes a slot, the result drops
        // "a", and the store's permutation check will reject it.
        let full = ids(&["a", "b", "c"]);
        let dragged = ids(&["x", "c", "a"]);
        let out = reconcile(&full, &dragged);
        assert_eq!(out.len(), 3);
        assert!(out.contains(&TaskId::from("x")));
    }
}
