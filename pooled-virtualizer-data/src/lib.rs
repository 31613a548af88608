//! Hierarchical, paged data for the `pooled-virtualizer` crate.
//!
//! The virtualizer only deals in flat indexes. This crate provides what a tree grid puts behind
//! them:
//!
//! - [`ItemCache`]: a tree of lazily loaded pages. Expanded items own a child node holding their
//!   children, and the whole tree is addressed by flat indexes.
//! - [`DataProvider`]: the seam to the data source, answered through a [`PageCallback`] either
//!   right away or later. [`ArrayDataProvider`] serves an in-memory list.
//! - [`GridController`]: binds cache items to the virtualizer's slots through a [`RowRenderer`],
//!   owns the expanded-item set, sorting and filtering.
//!
//! Like the core crate, nothing here holds UI objects or spawns work; the host drives the
//! controller from its own event loop.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod cache;
mod controller;
mod error;
mod key;
mod provider;

#[cfg(test)]
mod tests;

pub use cache::{CacheIndex, ItemCache, ItemKeyFn, NodeId, NodeInfo};
pub use controller::{GridController, GridOptions, RowContext, RowRenderer};
pub use error::CacheError;
pub use key::{ExpandedItems, ItemKey, KeySet};
pub use provider::{
    ArrayDataProvider, CompareFn, DataProvider, Filter, FilterFn, PageCallback, PageRequest,
    PageResponse, SortDirection, SortOrder,
};
