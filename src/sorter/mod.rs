//! Pluggable orderings.
//!
//! A [`Sorter`] compares two items and announces, through its
//! [`changed`](Sorter::changed) signal, whenever the way it compares items
//! changes. Models holding a sorter resort when that happens.
//!
//! - [`CustomSorter`]: a sorter backed by a closure
//! - [`MultiSorter`]: chains several sorters, the first non-equal one wins
//!
//! # Examples
//!
//! ```rust
//! use std::cmp::Ordering;
//! use sortlist::sorter::{CustomSorter, SortType, Sorter};
//!
//! let sorter = CustomSorter::new(|a: &i32, b: &i32| a.cmp(b));
//! assert_eq!(sorter.compare(&1, &2), Ordering::Less);
//!
//! sorter.set_sort_type(SortType::Descending);
//! assert_eq!(sorter.compare(&1, &2), Ordering::Greater);
//! ```

mod custom;
mod multi;

pub use custom::CustomSorter;
pub use multi::MultiSorter;

use crate::signal::Signal;
use std::cmp::Ordering;

/// How strictly a sorter orders items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SorterOrder {
    /// Every pair of items compares equal; sorting is a no-op.
    None,
    /// Distinct items may compare equal.
    Partial,
    /// Only identical items compare equal.
    Total,
}

/// Describes how a sorter's ordering changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SorterChange {
    /// The ordering may be completely different.
    Different,
    /// The ordering is the exact reverse of the previous one.
    Inverted,
    /// Items that compared unequal before may now compare equal.
    LessStrict,
    /// Items that compared equal before may now compare unequal.
    MoreStrict,
}

/// Direction applied to a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortType {
    /// Smaller items first.
    #[default]
    Ascending,
    /// Larger items first.
    Descending,
}

impl SortType {
    /// Applies the direction to an ascending comparison result.
    #[must_use]
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// An ordering over items of type `T`.
pub trait Sorter<T> {
    /// Compares two items.
    ///
    /// Must be consistent: a total preorder over every item it is asked to
    /// compare, until the next emission of [`changed`](Self::changed).
    fn compare(&self, first: &T, second: &T) -> Ordering;

    /// How strictly this sorter orders items.
    fn order(&self) -> SorterOrder {
        SorterOrder::Partial
    }

    /// Emitted after the ordering changed.
    fn changed(&self) -> &Signal<SorterChange>;
}
