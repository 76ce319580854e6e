//! Arena of entries threaded by two independent orderings.
//!
//! Every entry lives in one arena slot and carries two sets of tree links,
//! one per [`Order`]. Each ordering is an implicit treap: a binary tree
//! ordered by position (not by key) whose shape is balanced by random
//! priorities, with subtree sizes for positional lookups and parent links so
//! that the position of an entry can be computed from its handle.
//!
//! Handles ([`EntryId`]) stay valid while the entry is alive, no matter how
//! the rest of either ordering is rearranged.
//!
//! # Time Complexity
//!
//! | Operation       | Complexity        |
//! |-----------------|-------------------|
//! | `insert_at`     | O(log n) expected |
//! | `remove`        | O(log n) expected |
//! | `position_of`   | O(log n) expected |
//! | `nth`           | O(log n) expected |
//! | `search`        | O(log n) probes   |
//! | `rebuild`       | O(n)              |
//! | `iter`          | O(n)              |

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

const PRIORITY_SEED: u64 = 0x5eed_0f5e_9e9c_e000;

/// Selects one of the two orderings threaded through a [`Sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Ordered by the active sorter.
    Sorted = 0,
    /// Ordered like the source model.
    Unsorted = 1,
}

/// Stable handle of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy)]
struct Links {
    parent: Option<EntryId>,
    left: Option<EntryId>,
    right: Option<EntryId>,
    size: usize,
}

impl Links {
    const DETACHED: Self = Self {
        parent: None,
        left: None,
        right: None,
        size: 1,
    };
}

#[derive(Debug)]
struct Entry<T> {
    item: T,
    priority: u32,
    links: [Links; 2],
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    entry: Option<Entry<T>>,
}

/// Entries reachable through a sorted and an unsorted ordering.
#[derive(Debug)]
pub struct Sequence<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    roots: [Option<EntryId>; 2],
    live: usize,
    rng: SmallRng,
}

impl<T> Sequence<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            roots: [None, None],
            live: 0,
            rng: SmallRng::seed_from_u64(PRIORITY_SEED),
        }
    }

    /// Number of live entries, linked or not.
    pub const fn live(&self) -> usize {
        self.live
    }

    /// Number of entries linked into `order`.
    pub fn len(&self, order: Order) -> usize {
        self.size(order, self.roots[order as usize])
    }

    /// Allocates an entry that is not linked into either ordering yet.
    pub fn allocate(&mut self, item: T) -> EntryId {
        let entry = Entry {
            item,
            priority: self.rng.r#gen(),
            links: [Links::DETACHED; 2],
        };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            EntryId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            debug_assert!(index < u32::MAX, "sequence arena exhausted");
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            EntryId {
                index,
                generation: 0,
            }
        }
    }

    /// Frees an entry that has been unlinked from both orderings.
    pub fn release(&mut self, id: EntryId) -> T {
        let slot = &mut self.slots[id.index as usize];
        debug_assert_eq!(slot.generation, id.generation, "stale entry handle");
        let entry = slot.entry.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        match entry {
            Some(entry) => entry.item,
            None => unreachable!("entry {id:?} released twice"),
        }
    }

    pub fn item(&self, id: EntryId) -> &T {
        &self.entry(id).item
    }

    /// Returns `true` if `id` refers to a live entry.
    #[cfg(test)]
    pub fn contains(&self, id: EntryId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.generation == id.generation && slot.entry.is_some())
    }

    /// Links `id` into `order` so that it ends up at `position`.
    pub fn insert_at(&mut self, order: Order, position: usize, id: EntryId) {
        debug_assert!(position <= self.len(order));
        *self.links_mut(order, id) = Links::DETACHED;
        let (left, right) = self.split(order, self.roots[order as usize], position);
        let joined = self.merge(order, left, Some(id));
        let root = self.merge(order, joined, right);
        self.set_root(order, root);
    }

    /// Unlinks `id` from `order`, returning the position it had.
    pub fn remove(&mut self, order: Order, id: EntryId) -> usize {
        let position = self.position_of(order, id);
        let (left, rest) = self.split(order, self.roots[order as usize], position);
        let (removed, right) = self.split(order, rest, 1);
        debug_assert_eq!(removed, Some(id));
        *self.links_mut(order, id) = Links::DETACHED;
        let root = self.merge(order, left, right);
        self.set_root(order, root);
        position
    }

    /// Position of `id` within `order`.
    pub fn position_of(&self, order: Order, id: EntryId) -> usize {
        let mut position = self.size(order, self.links(order, id).left);
        let mut node = id;
        while let Some(parent) = self.links(order, node).parent {
            let links = self.links(order, parent);
            if links.right == Some(node) {
                position += self.size(order, links.left) + 1;
            }
            node = parent;
        }
        position
    }

    /// The entry at `position` within `order`.
    pub fn nth(&self, order: Order, mut position: usize) -> Option<EntryId> {
        let mut node = self.roots[order as usize];
        while let Some(id) = node {
            let links = self.links(order, id);
            let left = self.size(order, links.left);
            match position.cmp(&left) {
                Ordering::Less => node = links.left,
                Ordering::Equal => return Some(id),
                Ordering::Greater => {
                    position -= left + 1;
                    node = links.right;
                }
            }
        }
        None
    }

    /// Finds the position at which an entry belongs in `order`.
    ///
    /// `probe` compares the entry being placed against an entry already in
    /// the ordering. The result is the position after every entry the probe
    /// did not report as `Greater`.
    pub fn search<F>(&self, order: Order, mut probe: F) -> usize
    where
        F: FnMut(EntryId) -> Ordering,
    {
        let mut position = 0;
        let mut node = self.roots[order as usize];
        while let Some(id) = node {
            let links = self.links(order, id);
            if probe(id) == Ordering::Less {
                node = links.left;
            } else {
                position += self.size(order, links.left) + 1;
                node = links.right;
            }
        }
        position
    }

    /// Relinks `order` so that it holds exactly `ids`, in that order.
    pub fn rebuild(&mut self, order: Order, ids: &[EntryId]) {
        let mut spine: Vec<EntryId> = Vec::new();
        for &id in ids {
            *self.links_mut(order, id) = Links::DETACHED;
            let priority = self.entry(id).priority;
            let mut last = None;
            while let Some(&top) = spine.last() {
                if self.entry(top).priority >= priority {
                    break;
                }
                spine.pop();
                self.update(order, top);
                last = Some(top);
            }
            self.links_mut(order, id).left = last;
            if let Some(&top) = spine.last() {
                self.links_mut(order, top).right = Some(id);
            }
            spine.push(id);
        }
        while let Some(top) = spine.pop() {
            self.update(order, top);
        }
        let root = ids.first().map(|_| {
            let mut node = ids[0];
            while let Some(parent) = self.links(order, node).parent {
                node = parent;
            }
            node
        });
        self.set_root(order, root);
    }

    /// Iterates `order` front to back.
    pub fn iter(&self, order: Order) -> Iter<'_, T> {
        let mut next = self.roots[order as usize];
        while let Some(left) = next.and_then(|id| self.links(order, id).left) {
            next = Some(left);
        }
        Iter {
            sequence: self,
            order,
            next,
            remaining: self.len(order),
        }
    }

    /// Collects the handles of `order`, front to back.
    pub fn ids(&self, order: Order) -> Vec<EntryId> {
        self.iter(order).collect()
    }

    fn successor(&self, order: Order, id: EntryId) -> Option<EntryId> {
        if let Some(mut node) = self.links(order, id).right {
            while let Some(left) = self.links(order, node).left {
                node = left;
            }
            return Some(node);
        }
        let mut node = id;
        while let Some(parent) = self.links(order, node).parent {
            if self.links(order, parent).left == Some(node) {
                return Some(parent);
            }
            node = parent;
        }
        None
    }

    fn split(
        &mut self,
        order: Order,
        node: Option<EntryId>,
        count: usize,
    ) -> (Option<EntryId>, Option<EntryId>) {
        let Some(id) = node else {
            return (None, None);
        };
        let links = self.links(order, id);
        let left_size = self.size(order, links.left);
        if count <= left_size {
            let (left, middle) = self.split(order, links.left, count);
            self.links_mut(order, id).left = middle;
            self.update(order, id);
            self.detach_parent(order, left);
            (left, Some(id))
        } else {
            let (middle, right) = self.split(order, links.right, count - left_size - 1);
            self.links_mut(order, id).right = middle;
            self.update(order, id);
            self.detach_parent(order, right);
            (Some(id), right)
        }
    }

    fn merge(
        &mut self,
        order: Order,
        left: Option<EntryId>,
        right: Option<EntryId>,
    ) -> Option<EntryId> {
        let (left_id, right_id) = match (left, right) {
            (None, other) | (other, None) => return other,
            (Some(left_id), Some(right_id)) => (left_id, right_id),
        };
        if self.entry(left_id).priority > self.entry(right_id).priority {
            let merged = self.merge(order, self.links(order, left_id).right, right);
            self.links_mut(order, left_id).right = merged;
            self.update(order, left_id);
            Some(left_id)
        } else {
            let merged = self.merge(order, left, self.links(order, right_id).left);
            self.links_mut(order, right_id).left = merged;
            self.update(order, right_id);
            Some(right_id)
        }
    }

    /// Recomputes the size of `id` and points its children back at it.
    fn update(&mut self, order: Order, id: EntryId) {
        let Links { left, right, .. } = self.links(order, id);
        for child in [left, right].into_iter().flatten() {
            self.links_mut(order, child).parent = Some(id);
        }
        let size = self.size(order, left) + self.size(order, right) + 1;
        self.links_mut(order, id).size = size;
    }

    fn set_root(&mut self, order: Order, root: Option<EntryId>) {
        self.detach_parent(order, root);
        self.roots[order as usize] = root;
    }

    fn detach_parent(&mut self, order: Order, node: Option<EntryId>) {
        if let Some(id) = node {
            self.links_mut(order, id).parent = None;
        }
    }

    fn size(&self, order: Order, node: Option<EntryId>) -> usize {
        node.map_or(0, |id| self.links(order, id).size)
    }

    fn links(&self, order: Order, id: EntryId) -> Links {
        self.entry(id).links[order as usize]
    }

    fn links_mut(&mut self, order: Order, id: EntryId) -> &mut Links {
        &mut self.entry_mut(id).links[order as usize]
    }

    fn entry(&self, id: EntryId) -> &Entry<T> {
        let slot = &self.slots[id.index as usize];
        debug_assert_eq!(slot.generation, id.generation, "stale entry handle");
        match &slot.entry {
            Some(entry) => entry,
            None => unreachable!("entry {id:?} is not live"),
        }
    }

    fn entry_mut(&mut self, id: EntryId) -> &mut Entry<T> {
        let slot = &mut self.slots[id.index as usize];
        debug_assert_eq!(slot.generation, id.generation, "stale entry handle");
        match &mut slot.entry {
            Some(entry) => entry,
            None => unreachable!("entry {id:?} is not live"),
        }
    }
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Front-to-back iterator over one ordering of a [`Sequence`].
pub struct Iter<'a, T> {
    sequence: &'a Sequence<T>,
    order: Order,
    next: Option<EntryId>,
    remaining: usize,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = EntryId;

    fn next(&mut self) -> Option<EntryId> {
        let current = self.next?;
        self.next = self.sequence.successor(self.order, current);
        self.remaining -= 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
