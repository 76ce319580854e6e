//! The sorted projection of a source model.
//!
//! A [`Projection`] owns one entry per source item and keeps it reachable
//! through two orderings of a [`Sequence`]: the source order (used for
//! stable tie-breaks and to locate removed items) and the sorted order (what
//! observers of the sorted model see).
//!
//! Every mutation reports the smallest window of the sorted order it
//! touched. The window is tracked as the number of untouched entries before
//! and after it, which stays correct while removals and insertions shift
//! the positions of everything else.

use super::driver::SortKey;
use super::sequence::{EntryId, Order, Sequence};
use crate::model::ItemsChanged;
use crate::sorter::{Sorter, SorterOrder};
use std::cmp::Ordering;
use std::ops::Range;
use std::rc::Rc;

/// The ordering a projection sorts by: the section sorter first, then the
/// sorter.
pub struct Comparator<T> {
    section_sorter: Option<Rc<dyn Sorter<T>>>,
    sorter: Option<Rc<dyn Sorter<T>>>,
}

impl<T> Comparator<T> {
    pub fn new(
        section_sorter: Option<Rc<dyn Sorter<T>>>,
        sorter: Option<Rc<dyn Sorter<T>>>,
    ) -> Self {
        Self {
            section_sorter,
            sorter,
        }
    }

    /// Returns `true` if the comparator can tell any two items apart.
    pub fn sorts(&self) -> bool {
        [&self.section_sorter, &self.sorter]
            .into_iter()
            .flatten()
            .any(|sorter| sorter.order() != SorterOrder::None)
    }

    pub fn compare(&self, first: &T, second: &T) -> Ordering {
        [&self.section_sorter, &self.sorter]
            .into_iter()
            .flatten()
            .map(|sorter| sorter.compare(first, second))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Sorted and unsorted views over the same entries.
#[derive(Debug)]
pub struct Projection<T> {
    entries: Sequence<T>,
}

/// Untouched entries on either side of the changed window.
struct Window {
    before: usize,
    after: usize,
    touched: bool,
}

impl Window {
    const fn new(len: usize) -> Self {
        Self {
            before: len,
            after: len,
            touched: false,
        }
    }

    fn touch(&mut self, position: usize, len: usize) {
        self.before = self.before.min(position);
        self.after = self.after.min(len - position - 1);
        self.touched = true;
    }

    fn into_change(self, len_before: usize, len_after: usize) -> Option<ItemsChanged> {
        self.touched.then(|| {
            ItemsChanged::new(
                self.before,
                len_before - self.before - self.after,
                len_after - self.before - self.after,
            )
        })
    }
}

impl<T: Clone> Projection<T> {
    /// Creates a projection whose sorted order equals the source order.
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut entries = Sequence::new();
        let ids: Vec<EntryId> = items
            .into_iter()
            .map(|item| entries.allocate(item))
            .collect();
        entries.rebuild(Order::Unsorted, &ids);
        entries.rebuild(Order::Sorted, &ids);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        let len = self.entries.len(Order::Sorted);
        debug_assert_eq!(len, self.entries.len(Order::Unsorted));
        debug_assert_eq!(len, self.entries.live());
        len
    }

    /// The item at `position` in sorted order.
    pub fn item(&self, position: usize) -> Option<&T> {
        self.entries
            .nth(Order::Sorted, position)
            .map(|id| self.entries.item(id))
    }

    /// Snapshot of the sorted order for a merge sort.
    pub fn sort_keys(&self) -> Vec<SortKey> {
        self.entries
            .iter(Order::Sorted)
            .map(|id| SortKey {
                id,
                unsorted: self.entries.position_of(Order::Unsorted, id),
            })
            .collect()
    }

    /// Compares two keys, falling back to source order on ties.
    pub fn compare_keys(
        &self,
        comparator: &Comparator<T>,
        first: &SortKey,
        second: &SortKey,
    ) -> Ordering {
        comparator
            .compare(self.entries.item(first.id), self.entries.item(second.id))
            .then(first.unsorted.cmp(&second.unsorted))
    }

    /// Sorts to completion in one go.
    pub fn sort(&mut self, comparator: &Comparator<T>) -> Option<ItemsChanged> {
        let mut keys = self.sort_keys();
        keys.sort_by(|first, second| self.compare_keys(comparator, first, second));
        self.apply_order(keys.into_iter().map(|key| key.id).collect())
    }

    /// Replaces the sorted order by `ids`, which must hold every entry.
    pub fn apply_order(&mut self, ids: Vec<EntryId>) -> Option<ItemsChanged> {
        debug_assert_eq!(ids.len(), self.len());
        let change = changed_window(&self.entries.ids(Order::Sorted), &ids);
        if change.is_some() {
            self.entries.rebuild(Order::Sorted, &ids);
        }
        change
    }

    /// The change observers see when the sorted order collapses back to the
    /// source order.
    pub fn unsort_change(&self) -> Option<ItemsChanged> {
        changed_window(
            &self.entries.ids(Order::Sorted),
            &self.entries.ids(Order::Unsorted),
        )
    }

    /// Mirrors a source change: `removed` items at `position` were replaced
    /// by `added`.
    ///
    /// With a comparator the new entries are placed at their sorted position;
    /// without one they are appended to the sorted order, to be placed by a
    /// later sort.
    pub fn splice(
        &mut self,
        position: usize,
        removed: usize,
        added: Vec<T>,
        comparator: Option<&Comparator<T>>,
    ) -> Option<ItemsChanged> {
        let len_before = self.len();
        let mut window = Window::new(len_before);

        for _ in 0..removed {
            let Some(id) = self.entries.nth(Order::Unsorted, position) else {
                debug_assert!(false, "source removed more items than it holds");
                break;
            };
            let len = self.entries.len(Order::Sorted);
            let sorted = self.entries.remove(Order::Sorted, id);
            window.touch(sorted, len);
            self.entries.remove(Order::Unsorted, id);
            self.entries.release(id);
        }

        for (offset, item) in added.into_iter().enumerate() {
            let unsorted = position + offset;
            let id = self.entries.allocate(item);
            self.entries.insert_at(Order::Unsorted, unsorted, id);
            let sorted = match comparator {
                Some(comparator) => {
                    let item = self.entries.item(id);
                    self.entries.search(Order::Sorted, |other| {
                        comparator
                            .compare(item, self.entries.item(other))
                            .then_with(|| {
                                unsorted.cmp(&self.entries.position_of(Order::Unsorted, other))
                            })
                    })
                }
                None => self.entries.len(Order::Sorted),
            };
            self.entries.insert_at(Order::Sorted, sorted, id);
            window.touch(sorted, self.entries.len(Order::Sorted));
        }

        window.into_change(len_before, self.len())
    }

    /// The run of neighbours around `position` that `sorter` considers equal.
    pub fn section(&self, position: usize, sorter: &dyn Sorter<T>) -> Option<Range<usize>> {
        let item = self.item(position)?;
        let same = |candidate: usize| {
            self.item(candidate)
                .is_some_and(|other| sorter.compare(item, other) == Ordering::Equal)
        };

        let mut start = position;
        while start > 0 && same(start - 1) {
            start -= 1;
        }
        let mut end = position + 1;
        while same(end) {
            end += 1;
        }
        Some(start..end)
    }

    /// Items in sorted order.
    pub fn items(&self) -> Vec<T> {
        self.entries
            .iter(Order::Sorted)
            .map(|id| self.entries.item(id).clone())
            .collect()
    }
}

/// The window that differs between two orderings of the same entries.
fn changed_window(old: &[EntryId], new: &[EntryId]) -> Option<ItemsChanged> {
    let len = old.len().min(new.len());
    let before = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    if before == len && old.len() == new.len() {
        return None;
    }
    let after = old[before..]
        .iter()
        .rev()
        .zip(new[before..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    Some(ItemsChanged::new(
        before,
        old.len() - before - after,
        new.len() - before - after,
    ))
}
