#[cfg(not(feature = "std"))]
use alloc::collections::BTreeSet;
#[cfg(feature = "std")]
use std::collections::HashSet;

/// Identity of an item, as returned by the grid's `item_key` function.
///
/// Hashable with `std`, ordered without it.
#[cfg(feature = "std")]
pub trait ItemKey: core::hash::Hash + Eq + Clone {}
#[cfg(feature = "std")]
impl<K: core::hash::Hash + Eq + Clone> ItemKey for K {}

#[cfg(not(feature = "std"))]
pub trait ItemKey: Ord + Clone {}
#[cfg(not(feature = "std"))]
impl<K: Ord + Clone> ItemKey for K {}

/// Set of expanded item keys.
#[cfg(feature = "std")]
pub type KeySet<K> = HashSet<K>;
#[cfg(not(feature = "std"))]
pub type KeySet<K> = BTreeSet<K>;

/// Answers "is this item expanded?" for the cache.
///
/// Implemented for [`KeySet`] and for plain predicates (`Fn(&K) -> bool`).
pub trait ExpandedItems<K> {
    fn is_expanded(&self, key: &K) -> bool;
}

impl<K: ItemKey> ExpandedItems<K> for KeySet<K> {
    fn is_expanded(&self, key: &K) -> bool {
        self.contains(key)
    }
}

impl<K, F: Fn(&K) -> bool> ExpandedItems<K> for F {
    fn is_expanded(&self, key: &K) -> bool {
        self(key)
    }
}
