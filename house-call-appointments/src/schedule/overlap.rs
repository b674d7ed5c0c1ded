use std::collections::BTreeSet;

/// Whether two occupied-slot sets may live on the same calendar.
///
/// Disjoint sets are fine. A single shared slot is allowed only when the two
/// blocks meet edge to edge: the shared slot is the last slot of one and the
/// first slot of the other (10:30 ends a 09:00 block and starts a 10:30 one).
/// Sharing two or more slots, or one interior slot, is a double booking.
pub fn overlap_allowed(existing: &BTreeSet<usize>, new: &BTreeSet<usize>) -> bool {
    let mut shared = existing.intersection(new);
    let Some(&shared_idx) = shared.next() else {
        return true;
    };
    if shared.next().is_some() {
        return false;
    }

    let existing_ends_where_new_begins =
        existing.last() == Some(&shared_idx) && new.first() == Some(&shared_idx);
    let new_ends_where_existing_begins =
        new.last() == Some(&shared_idx) && existing.first() == Some(&shared_idx);

    existing_ends_where_new_begins || new_ends_where_existing_begins
}
