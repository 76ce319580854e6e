//! The list model capability.
//!
//! A list model is an ordered, observable collection: it reports how many
//! items it holds, hands out an item by position, and emits an
//! [`ItemsChanged`] every time a contiguous range of it is replaced.
//!
//! - [`ListModel`]: the capability itself
//! - [`ListStore`]: a plain mutable list implementing it
//!
//! [`SortListModel`](crate::sort::SortListModel) both consumes and
//! implements [`ListModel`], so sorted views compose wherever a plain list
//! is expected.
//!
//! # Examples
//!
//! ```rust
//! use sortlist::model::{ListModel, ListStore};
//!
//! let store = ListStore::from_iter([3, 1, 2]);
//! assert_eq!(store.n_items(), 3);
//! assert_eq!(store.item(0), Some(3));
//! assert_eq!(store.item(sortlist::model::INVALID_POSITION), None);
//! ```

mod store;

pub use store::{ListStore, ListStoreError};

use crate::signal::Signal;

/// A position that is never valid; looking it up always yields `None`.
pub const INVALID_POSITION: usize = usize::MAX;

/// Describes one change of a list model.
///
/// At `position`, `removed` items were replaced by `added` new ones. Items
/// before `position` are untouched; items after the replaced range keep
/// their relative order and shift by `added - removed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemsChanged {
    /// First position that changed.
    pub position: usize,
    /// Number of items removed at `position`.
    pub removed: usize,
    /// Number of items added at `position`.
    pub added: usize,
}

impl ItemsChanged {
    /// Creates a change description.
    #[must_use]
    pub const fn new(position: usize, removed: usize, added: usize) -> Self {
        Self {
            position,
            removed,
            added,
        }
    }

    /// Returns `true` if the change neither removes nor adds anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.removed == 0 && self.added == 0
    }

    /// Whether the number of items changes.
    #[must_use]
    pub const fn changes_len(&self) -> bool {
        self.removed != self.added
    }
}

/// An ordered collection that announces its changes.
///
/// Implementations must emit [`items_changed`](Self::items_changed)
/// synchronously, after their storage already reflects the change, and must
/// never emit an empty change.
pub trait ListModel<T> {
    /// Number of items in the model.
    fn n_items(&self) -> usize;

    /// The item at `position`, or `None` if `position >= n_items()`.
    fn item(&self, position: usize) -> Option<T>;

    /// Emitted after every change of the model.
    fn items_changed(&self) -> &Signal<ItemsChanged>;

    /// Returns `true` if the model holds no items.
    fn is_empty(&self) -> bool {
        self.n_items() == 0
    }

    /// Copies every item, in model order.
    fn snapshot(&self) -> Vec<T> {
        (0..self.n_items())
            .map_while(|position| self.item(position))
            .collect()
    }
}
