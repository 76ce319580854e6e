//! # sortlist
//!
//! An incrementally sorted, mutation-tolerant projection of a dynamic list
//! model.
//!
//! ## Overview
//!
//! A [`SortListModel`](sort::SortListModel) observes a source list model and
//! presents its items in the order defined by a pluggable
//! [`Sorter`](sorter::Sorter). The sorted view:
//!
//! - **Is stable**: items comparing equal keep their source order
//! - **Tracks the source**: every source change is mirrored with a single,
//!   minimal change notification
//! - **Sorts incrementally**: large resorts can run in bounded slices driven
//!   by the host event loop, while the source keeps changing
//! - **Composes**: it is itself a [`ListModel`](model::ListModel)
//!
//! ## Modules
//!
//! - [`signal`]: typed, reentrancy-safe observer lists
//! - [`model`]: the list model capability and [`ListStore`](model::ListStore)
//! - [`sorter`]: the sorter capability, [`CustomSorter`](sorter::CustomSorter)
//!   and [`MultiSorter`](sorter::MultiSorter)
//! - [`sort`]: [`SortListModel`](sort::SortListModel)
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for the plain value types
//! - `async`: [`SortListModel::sort_async`](sort::SortListModel), driving an
//!   incremental sort from a tokio task
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use sortlist::prelude::*;
//!
//! let store = Rc::new(ListStore::from_iter([4, 8, 2, 6, 10]));
//! let sorter = Rc::new(CustomSorter::new(|a: &i32, b: &i32| a.cmp(b)));
//! let model = SortListModel::<i32>::with_options(
//!     Some(store.clone()),
//!     Some(sorter),
//!     SortOptions::default().with_incremental(true).with_step_budget(2),
//! );
//!
//! // Sorting happens as the host drives it.
//! assert!(model.pending() > 0);
//! while model.step() {}
//! assert_eq!(model.pending(), 0);
//! assert_eq!(model.snapshot(), vec![2, 4, 6, 8, 10]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use sortlist::prelude::*;
/// ```
pub mod prelude {
    pub use crate::model::{INVALID_POSITION, ItemsChanged, ListModel, ListStore};
    pub use crate::signal::{HandlerId, Signal};
    pub use crate::sort::{Property, SortListModel, SortOptions};
    pub use crate::sorter::{
        CustomSorter, MultiSorter, SortType, Sorter, SorterChange, SorterOrder,
    };
}

pub mod model;
pub mod signal;
pub mod sort;
pub mod sorter;
