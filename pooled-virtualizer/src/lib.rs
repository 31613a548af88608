//! A headless, element-recycling virtualization engine.
//!
//! For paged/hierarchical data and the glue that binds it to the pool, see the
//! `pooled-virtualizer-data` crate.
//!
//! The engine renders lists of any length with a pool of visual elements whose size depends on
//! the viewport, not on the list:
//! - a pool of slots is recycled from the trailing edge to the leading edge while scrolling,
//! - item sizes are measured as slots are bound, and a running average projects the size of
//!   everything that has never been rendered,
//! - the estimated content height and the scroll offset are corrected as estimates are replaced
//!   by measurements, without moving the visible content.
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - a [`SlotHost`] that owns the elements (create, bind, measure, position)
//! - the viewport height and scroll events
//! - a loop that drives the [`Lane`]s (`run_frame`, `run_microtasks`, `run_idle`)
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod estimator;
mod host;
mod options;
mod pool;
mod reconciler;
mod scheduler;
mod state;
mod types;
mod virtualizer;


pub use host::SlotHost;
pub use options::VirtualizerOptions;
pub use scheduler::Lane;
pub use state::PoolSnapshot;
pub use types::{PoolItem, ScrollDirection, VirtualRange};
pub use virtualizer::Virtualizer;
