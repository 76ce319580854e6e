use super::{Sorter, SorterChange, SorterOrder};
use crate::signal::{HandlerId, Signal};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};

struct Child<T> {
    sorter: Rc<dyn Sorter<T>>,
    handler: HandlerId,
}

/// Combines several sorters: items are compared by the first sorter, ties are
/// broken by the second, and so on.
///
/// # Examples
///
/// ```rust
/// use std::rc::Rc;
/// use sortlist::sorter::{CustomSorter, MultiSorter, Sorter};
///
/// let sorter = MultiSorter::<(u8, u8)>::new();
/// sorter.append(Rc::new(CustomSorter::new(|a: &(u8, u8), b: &(u8, u8)| a.0.cmp(&b.0))));
/// sorter.append(Rc::new(CustomSorter::new(|a: &(u8, u8), b: &(u8, u8)| b.1.cmp(&a.1))));
///
/// assert!(sorter.compare(&(1, 5), &(2, 0)).is_lt());
/// assert!(sorter.compare(&(1, 5), &(1, 9)).is_gt());
/// ```
pub struct MultiSorter<T> {
    this: Weak<Self>,
    children: RefCell<Vec<Child<T>>>,
    changed: Signal<SorterChange>,
}

impl<T: 'static> MultiSorter<T> {
    /// Creates a sorter without children; it compares every item equal.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            children: RefCell::new(Vec::new()),
            changed: Signal::new(),
        })
    }

    /// Adds `sorter` as the least significant comparison.
    pub fn append(&self, sorter: Rc<dyn Sorter<T>>) {
        let this = self.this.clone();
        let handler = sorter.changed().connect(move |change| {
            if let Some(this) = this.upgrade() {
                let forwarded = match change {
                    SorterChange::Inverted => SorterChange::Different,
                    other => *other,
                };
                this.changed.emit(&forwarded);
            }
        });
        self.children.borrow_mut().push(Child { sorter, handler });
        self.changed.emit(&SorterChange::MoreStrict);
    }

    /// Removes the child at `position`, returning it.
    pub fn remove(&self, position: usize) -> Option<Rc<dyn Sorter<T>>> {
        let child = {
            let mut children = self.children.borrow_mut();
            (position < children.len()).then(|| children.remove(position))
        }?;
        child.sorter.changed().disconnect(child.handler);
        self.changed.emit(&SorterChange::LessStrict);
        Some(child.sorter)
    }

    /// Number of child sorters.
    pub fn len(&self) -> usize {
        self.children.borrow().len()
    }

    /// Returns `true` if there are no child sorters.
    pub fn is_empty(&self) -> bool {
        self.children.borrow().is_empty()
    }
}

impl<T: 'static> Sorter<T> for MultiSorter<T> {
    fn compare(&self, first: &T, second: &T) -> Ordering {
        // Cloned out so a child may touch this sorter while comparing.
        let children: SmallVec<[Rc<dyn Sorter<T>>; 4]> = self
            .children
            .borrow()
            .iter()
            .map(|child| Rc::clone(&child.sorter))
            .collect();
        children
            .iter()
            .map(|sorter| sorter.compare(first, second))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    fn order(&self) -> SorterOrder {
        self.children
            .borrow()
            .iter()
            .map(|child| child.sorter.order())
            .max()
            .unwrap_or(SorterOrder::None)
    }

    fn changed(&self) -> &Signal<SorterChange> {
        &self.changed
    }
}

impl<T> Drop for MultiSorter<T> {
    fn drop(&mut self) {
        for child in self.children.get_mut().drain(..) {
            child.sorter.changed().disconnect(child.handler);
        }
    }
}

impl<T> fmt::Debug for MultiSorter<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MultiSorter")
            .field("children", &self.children.borrow().len())
            .finish_non_exhaustive()
    }
}
