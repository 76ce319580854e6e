//! A plain mutable list model.

use super::{ItemsChanged, ListModel};
use crate::signal::Signal;
use std::cell::RefCell;
use std::fmt;

/// Errors returned by [`ListStore`] mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStoreError {
    /// The requested range does not fit inside the store.
    OutOfRange {
        /// First position of the requested range.
        position: usize,
        /// Number of items the range covers.
        count: usize,
        /// Number of items in the store.
        len: usize,
    },
}

impl fmt::Display for ListStoreError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                position,
                count,
                len,
            } => write!(
                formatter,
                "range {position}..{} is out of bounds for a store of {len} items",
                position.saturating_add(*count)
            ),
        }
    }
}

impl std::error::Error for ListStoreError {}

/// A mutable list of items that announces every mutation.
///
/// All mutations take `&self`: a store is usually shared (`Rc`) between its
/// owner and the models observing it, and observers may read it back while
/// it emits.
///
/// # Examples
///
/// ```rust
/// use sortlist::model::{ListModel, ListStore};
///
/// let store = ListStore::new();
/// store.append(10);
/// store.append(30);
/// store.insert(1, 20).unwrap();
/// assert_eq!(store.snapshot(), vec![10, 20, 30]);
///
/// store.splice(0, 2, [1, 2, 3]).unwrap();
/// assert_eq!(store.snapshot(), vec![1, 2, 3, 30]);
/// ```
pub struct ListStore<T> {
    items: RefCell<Vec<T>>,
    items_changed: Signal<ItemsChanged>,
}

impl<T: Clone> ListStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: RefCell::new(Vec::new()),
            items_changed: Signal::new(),
        }
    }

    /// Number of items in the store.
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Appends one item.
    pub fn append(&self, item: T) {
        let position = self.len();
        self.items.borrow_mut().push(item);
        self.emit(ItemsChanged::new(position, 0, 1));
    }

    /// Appends every item of `items` with a single notification.
    ///
    /// `items` is drained before the store is touched, so it may read the
    /// store back.
    pub fn extend<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let additions: Vec<T> = items.into_iter().collect();
        let position = self.len();
        let added = additions.len();
        self.items.borrow_mut().extend(additions);
        self.emit(ItemsChanged::new(position, 0, added));
    }

    /// Inserts `item` before `position`; `position == len()` appends.
    ///
    /// # Errors
    ///
    /// Returns [`ListStoreError::OutOfRange`] if `position > len()`.
    pub fn insert(&self, position: usize, item: T) -> Result<(), ListStoreError> {
        self.splice(position, 0, std::iter::once(item))
    }

    /// Removes and returns the item at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`ListStoreError::OutOfRange`] if `position >= len()`.
    pub fn remove(&self, position: usize) -> Result<T, ListStoreError> {
        let len = self.len();
        if position >= len {
            return Err(ListStoreError::OutOfRange {
                position,
                count: 1,
                len,
            });
        }
        let item = self.items.borrow_mut().remove(position);
        self.emit(ItemsChanged::new(position, 1, 0));
        Ok(item)
    }

    /// Removes every item.
    pub fn remove_all(&self) {
        let removed = std::mem::take(&mut *self.items.borrow_mut()).len();
        self.emit(ItemsChanged::new(0, removed, 0));
    }

    /// Replaces `n_removals` items at `position` by `additions`.
    ///
    /// # Errors
    ///
    /// Returns [`ListStoreError::OutOfRange`] if the removed range does not
    /// fit inside the store. The store is left untouched in that case.
    pub fn splice<I>(
        &self,
        position: usize,
        n_removals: usize,
        additions: I,
    ) -> Result<(), ListStoreError>
    where
        I: IntoIterator<Item = T>,
    {
        let additions: Vec<T> = additions.into_iter().collect();
        let len = self.len();
        let end = position
            .checked_add(n_removals)
            .filter(|end| *end <= len)
            .ok_or(ListStoreError::OutOfRange {
                position,
                count: n_removals,
                len,
            })?;

        let added = additions.len();
        self.items.borrow_mut().splice(position..end, additions);
        self.emit(ItemsChanged::new(position, n_removals, added));
        Ok(())
    }

    /// Position of the first item matching `predicate`.
    pub fn find<P>(&self, mut predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.borrow().iter().position(|item| predicate(item))
    }

    fn emit(&self, change: ItemsChanged) {
        if !change.is_empty() {
            self.items_changed.emit(&change);
        }
    }
}

impl<T: Clone> ListModel<T> for ListStore<T> {
    fn n_items(&self) -> usize {
        self.len()
    }

    fn item(&self, position: usize) -> Option<T> {
        self.items.borrow().get(position).cloned()
    }

    fn items_changed(&self) -> &Signal<ItemsChanged> {
        &self.items_changed
    }

    fn snapshot(&self) -> Vec<T> {
        self.items.borrow().clone()
    }
}

impl<T: Clone> Default for ListStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> FromIterator<T> for ListStore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: RefCell::new(iter.into_iter().collect()),
            items_changed: Signal::new(),
        }
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for ListStore<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_list()
            .entries(self.items.borrow().iter())
            .finish()
    }
}
