use core::fmt;

use crate::NodeId;

/// A malformed provider response, reported through `take_diagnostics`.
///
/// None of these are fatal: the cache keeps serving what it has.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CacheError {
    /// A child collection answered without a total size. The node's size falls back to the
    /// number of items observed so far.
    MissingSize { node: NodeId, page: usize },
    /// A page held more than `page_size` items; the extra items were dropped.
    PageOverflow {
        node: NodeId,
        page: usize,
        len: usize,
        page_size: usize,
    },
    /// A page held fewer items than the collection's size promised. Only the received items are
    /// served; the page is not requested again until the size changes.
    ShortPage {
        node: NodeId,
        page: usize,
        len: usize,
        expected: usize,
    },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSize { node, page } => write!(
                f,
                "provider returned no size for page {page} of child collection {node}"
            ),
            Self::PageOverflow {
                node,
                page,
                len,
                page_size,
            } => write!(
                f,
                "page {page} of collection {node} has {len} items (page size {page_size})"
            ),
            Self::ShortPage {
                node,
                page,
                len,
                expected,
            } => write!(
                f,
                "page {page} of collection {node} has {len} items, expected {expected}"
            ),
        }
    }
}

impl core::error::Error for CacheError {}
