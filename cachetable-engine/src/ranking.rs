//! Access-count ranking.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::item::Item;

/// Orders `items` by access count, highest first, and keeps the top `count`.
///
/// Counts are read once up front so concurrent keep-alives cannot reorder
/// items mid-sort. Ties come out in no particular order.
pub(crate) fn most_accessed<K, V>(items: Vec<Arc<Item<K, V>>>, count: usize) -> Vec<Arc<Item<K, V>>> {
    if count == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(u64, Arc<Item<K, V>>)> = items
        .into_iter()
        .map(|item| (item.access_count(), item))
        .collect();

    let by_hits = |a: &(u64, Arc<Item<K, V>>), b: &(u64, Arc<Item<K, V>>)| -> Ordering { b.0.cmp(&a.0) };
    if count < ranked.len() {
        ranked.select_nth_unstable_by(count - 1, by_hits);
        ranked.truncate(count);
    }
    ranked.sort_unstable_by(by_hits);

    ranked.into_iter().map(|(_, item)| item).collect()
}
