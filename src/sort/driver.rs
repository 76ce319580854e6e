//! Resumable bottom-up merge sort.
//!
//! [`MergeSort`] sorts a snapshot of [`SortKey`]s in bounded steps. Each call
//! to [`step`](MergeSort::step) produces at most `budget` merge outputs and
//! then returns, keeping its cursor so the next call resumes exactly where
//! the previous one stopped. Runs that are already in order are copied
//! without element-wise merging, so resorting a nearly sorted list is cheap.
//!
//! The driver never looks at the projection directly: it owns the snapshot
//! and asks the caller to compare keys. A projection that changes while a
//! sort is running must therefore discard the driver and start a new one.

use super::sequence::EntryId;
use std::cmp::Ordering;

/// One entry to sort, with its position in source order for tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub id: EntryId,
    pub unsorted: usize,
}

/// Cursor of a partially merged pair of runs.
#[derive(Debug, Clone, Copy)]
struct Merge {
    left: usize,
    middle: usize,
    right: usize,
    end: usize,
    out: usize,
}

/// A merge sort that can be suspended between any two outputs.
#[derive(Debug)]
pub struct MergeSort {
    source: Vec<SortKey>,
    target: Vec<SortKey>,
    width: usize,
    next_run: usize,
    merge: Option<Merge>,
    pending: usize,
}

impl MergeSort {
    pub fn new(keys: Vec<SortKey>) -> Self {
        let len = keys.len();
        let passes = if len > 1 {
            (usize::BITS - (len - 1).leading_zeros()) as usize
        } else {
            0
        };
        Self {
            target: keys.clone(),
            source: keys,
            width: 1,
            next_run: 0,
            merge: None,
            pending: len * passes,
        }
    }

    /// Merge outputs left until the sort completes.
    pub const fn pending(&self) -> usize {
        self.pending
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_finished(&self) -> bool {
        self.width >= self.source.len()
    }

    /// Performs up to `budget` outputs. Returns `true` while work remains.
    pub fn step<F>(&mut self, budget: usize, mut compare: F) -> bool
    where
        F: FnMut(&SortKey, &SortKey) -> Ordering,
    {
        let mut budget = budget.max(1);
        while budget > 0 && !self.is_finished() {
            let Some(mut merge) = self.merge.take() else {
                budget = budget.saturating_sub(self.begin_run(&mut compare));
                continue;
            };

            while budget > 0 && merge.out < merge.end {
                let take_left = merge.right >= merge.end
                    || (merge.left < merge.middle
                        && compare(&self.source[merge.left], &self.source[merge.right])
                            != Ordering::Greater);
                if take_left {
                    self.target[merge.out] = self.source[merge.left];
                    merge.left += 1;
                } else {
                    self.target[merge.out] = self.source[merge.right];
                    merge.right += 1;
                }
                merge.out += 1;
                budget -= 1;
                self.pending -= 1;
            }

            if merge.out < merge.end {
                self.merge = Some(merge);
            } else {
                self.end_run();
            }
        }
        !self.is_finished()
    }

    /// The sorted handles. Only meaningful once [`is_finished`](Self::is_finished).
    pub fn into_sorted(self) -> Vec<EntryId> {
        debug_assert!(self.is_finished(), "merge sort consumed before completion");
        debug_assert_eq!(self.pending, 0);
        self.source.into_iter().map(|key| key.id).collect()
    }

    /// Sets up the next pair of runs, returning the outputs spent on it.
    fn begin_run<F>(&mut self, compare: &mut F) -> usize
    where
        F: FnMut(&SortKey, &SortKey) -> Ordering,
    {
        let len = self.source.len();
        let start = self.next_run;
        let middle = (start + self.width).min(len);
        let end = (start + 2 * self.width).min(len);
        self.next_run = end;

        let in_order = middle == end
            || compare(&self.source[middle - 1], &self.source[middle]) != Ordering::Greater;
        if in_order {
            self.target[start..end].copy_from_slice(&self.source[start..end]);
            self.pending -= end - start;
            self.end_run();
            end - start
        } else {
            self.merge = Some(Merge {
                left: start,
                middle,
                right: middle,
                end,
                out: start,
            });
            0
        }
    }

    fn end_run(&mut self) {
        if self.next_run >= self.source.len() {
            std::mem::swap(&mut self.source, &mut self.target);
            self.width = self.width.saturating_mul(2);
            self.next_run = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::sequence::Sequence;
    use rstest::rstest;

    fn keys_for(values: &[i32]) -> (Sequence<i32>, Vec<SortKey>) {
        let mut sequence = Sequence::new();
        let keys = values
            .iter()
            .enumerate()
            .map(|(unsorted, &value)| SortKey {
                id: sequence.allocate(value),
                unsorted,
            })
            .collect();
        (sequence, keys)
    }

    fn sorted_values(sequence: &Sequence<i32>, sort: MergeSort) -> Vec<i32> {
        sort.into_sorted()
            .into_iter()
            .map(|id| *sequence.item(id))
            .collect()
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![7])]
    #[case(vec![2, 1])]
    #[case(vec![4, 8, 2, 6, 10])]
    #[case(vec![5, 4, 3, 2, 1, 0, -1])]
    #[case(vec![1, 1, 1, 0, 0, 0])]
    fn test_step_by_step_sort_matches_std(#[case] values: Vec<i32>) {
        let (sequence, keys) = keys_for(&values);
        let mut sort = MergeSort::new(keys);

        let mut steps = 0;
        while sort.step(1, |a, b| {
            sequence
                .item(a.id)
                .cmp(sequence.item(b.id))
                .then(a.unsorted.cmp(&b.unsorted))
        }) {
            steps += 1;
            assert!(steps <= values.len() * values.len() + 1);
        }

        let mut expected = values.clone();
        expected.sort_unstable();
        assert_eq!(sort.pending(), 0);
        assert_eq!(sorted_values(&sequence, sort), expected);
    }

    #[rstest]
    fn test_every_step_makes_progress() {
        let values: Vec<i32> = (0..1000).map(|value| (value * 7919) % 1000).collect();
        let (sequence, keys) = keys_for(&values);
        let mut sort = MergeSort::new(keys);
        let initial = sort.pending();
        assert_eq!(initial, 1000 * 10);

        let mut previous = initial;
        while sort.step(64, |a, b| sequence.item(a.id).cmp(sequence.item(b.id))) {
            assert!(sort.pending() < previous);
            previous = sort.pending();
        }
        assert_eq!(sort.pending(), 0);
    }

    #[rstest]
    fn test_sorted_input_finishes_without_merging() {
        let values: Vec<i32> = (0..256).collect();
        let (sequence, keys) = keys_for(&values);
        let mut sort = MergeSort::new(keys);
        let mut comparisons = 0;

        while sort.step(usize::MAX, |a, b| {
            comparisons += 1;
            sequence.item(a.id).cmp(sequence.item(b.id))
        }) {}

        assert_eq!(comparisons, 255);
        assert_eq!(sorted_values(&sequence, sort), values);
    }
}
