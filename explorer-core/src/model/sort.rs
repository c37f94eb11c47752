//! ``src/model/sort.rs``
//! ============================================================================
//! # Sort engine
//!
//! Sibling order is `(rank, kind, name)`: explicit ranks first (absent ranks
//! count as +infinity), folders before files on a rank tie, then a
//! case-insensitive name collation. The raw path breaks any remaining tie so
//! the order is total.

use std::cmp::Ordering;

use crate::model::item::Item;
use crate::model::order_store::OrderStore;
use crate::model::tree::TreeProvider;

/// Compare two display names the way a user-facing list would.
///
/// Primary level ignores case; on a primary tie, lowercase sorts before
/// uppercase at the first differing character.
pub fn collate(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    if primary != Ordering::Equal {
        return primary;
    }
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca == cb {
            continue;
        }
        match (ca.is_lowercase(), cb.is_lowercase()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => return ca.cmp(&cb),
        }
    }
    a.len().cmp(&b.len())
}

/// Full comparator used for every sibling group.
pub fn compare(a: &Item, b: &Item, order: &OrderStore) -> Ordering {
    let rank_key = |item: &Item| {
        let rank = order.rank(&item.path);
        (rank.is_none(), rank.unwrap_or(0))
    };
    rank_key(a)
        .cmp(&rank_key(b))
        .then_with(|| a.kind.is_file().cmp(&b.kind.is_file()))
        .then_with(|| collate(&a.name, &b.name))
        .then_with(|| a.path.cmp(&b.path))
}

pub fn sort_items(items: &mut [Item], order: &OrderStore) {
    items.sort_by(|a, b| compare(a, b, order));
}

/// Children of `folder` in display order, without ignored entries.
pub fn sorted_children(
    tree: &(impl TreeProvider + ?Sized),
    folder: &str,
    order: &OrderStore,
) -> Vec<Item> {
    let mut children: Vec<Item> = tree
        .children(folder)
        .into_iter()
        .filter(|item| !item.is_ignored())
        .collect();
    sort_items(&mut children, order);
    children
}
