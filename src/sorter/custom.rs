use super::{SortType, Sorter, SorterChange, SorterOrder};
use crate::signal::Signal;
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

type CompareFn<T> = Rc<dyn Fn(&T, &T) -> Ordering>;

/// A sorter backed by a comparison closure.
///
/// Without a closure every item compares equal and the sorter reports
/// [`SorterOrder::None`].
///
/// # Examples
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use sortlist::sorter::{CustomSorter, Sorter, SorterChange};
///
/// // Sorts by the key modulo a configurable divisor.
/// let divisor = Rc::new(Cell::new(10));
/// let key = Rc::clone(&divisor);
/// let sorter = CustomSorter::new(move |a: &u32, b: &u32| (a % key.get()).cmp(&(b % key.get())));
///
/// assert!(sorter.compare(&13, &21).is_gt());
/// divisor.set(4);
/// sorter.notify_changed(SorterChange::Different);
/// assert!(sorter.compare(&13, &21).is_eq());
/// ```
pub struct CustomSorter<T> {
    compare: RefCell<Option<CompareFn<T>>>,
    sort_type: Cell<SortType>,
    changed: Signal<SorterChange>,
}

impl<T> CustomSorter<T> {
    /// Creates a sorter comparing with `compare`.
    pub fn new<F>(compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        Self {
            compare: RefCell::new(Some(Rc::new(compare))),
            sort_type: Cell::new(SortType::Ascending),
            changed: Signal::new(),
        }
    }

    /// Creates a sorter that considers every item equal.
    #[must_use]
    pub fn unordered() -> Self {
        Self {
            compare: RefCell::new(None),
            sort_type: Cell::new(SortType::Ascending),
            changed: Signal::new(),
        }
    }

    /// Builder variant of [`set_sort_type`](Self::set_sort_type).
    #[must_use]
    pub fn with_sort_type(self, sort_type: SortType) -> Self {
        self.sort_type.set(sort_type);
        self
    }

    /// Replaces the comparison closure; `None` makes every item equal.
    pub fn set_compare<F>(&self, compare: Option<F>)
    where
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        *self.compare.borrow_mut() = compare.map(|compare| Rc::new(compare) as CompareFn<T>);
        self.changed.emit(&SorterChange::Different);
    }

    /// The direction applied to the closure's result.
    pub fn sort_type(&self) -> SortType {
        self.sort_type.get()
    }

    /// Sets the direction, announcing [`SorterChange::Inverted`] if it flips.
    pub fn set_sort_type(&self, sort_type: SortType) {
        if self.sort_type.replace(sort_type) != sort_type {
            self.changed.emit(&SorterChange::Inverted);
        }
    }

    /// Announces that state captured by the closure changed.
    pub fn notify_changed(&self, change: SorterChange) {
        self.changed.emit(&change);
    }
}

impl<T> Sorter<T> for CustomSorter<T> {
    fn compare(&self, first: &T, second: &T) -> Ordering {
        let compare = self.compare.borrow().clone();
        compare.map_or(Ordering::Equal, |compare| {
            self.sort_type.get().apply(compare(first, second))
        })
    }

    fn order(&self) -> SorterOrder {
        if self.compare.borrow().is_some() {
            SorterOrder::Partial
        } else {
            SorterOrder::None
        }
    }

    fn changed(&self) -> &Signal<SorterChange> {
        &self.changed
    }
}

impl<T> fmt::Debug for CustomSorter<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CustomSorter")
            .field("has_compare", &self.compare.borrow().is_some())
            .field("sort_type", &self.sort_type.get())
            .finish_non_exhaustive()
    }
}
