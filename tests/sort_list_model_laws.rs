//! Property-based tests for the laws every SortListModel state satisfies.
//!
//! Items are `(key, tag)` pairs. Sorters only look at the key, so many items
//! compare equal, and the unique tag tells equal items apart.
//!
//! 1. **Stable order**: the model equals a stable sort of the source
//! 2. **Count**: the model always holds exactly as many items as the source
//! 3. **Faithful notifications**: replaying every change on a mirror
//!    reproduces the model
//! 4. **Minimal notifications**: each change covers exactly the window
//!    between the longest unchanged prefix and suffix
//! 5. **Round trip**: clearing the sorter restores the source order
//! 6. **Incremental equivalence**: interleaving source edits with partial
//!    sort steps ends in the same order as sorting synchronously

use proptest::prelude::*;
use sortlist::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

type Item = (u8, u32);

/// `(position seed, removal seed, keys to insert)`
type Edit = (usize, usize, Vec<u8>);

struct Harness {
    store: Rc<ListStore<Item>>,
    model: Rc<SortListModel<Item>>,
    mirror: Rc<RefCell<Vec<Item>>>,
    changes: Rc<RefCell<Vec<(Vec<Item>, ItemsChanged)>>>,
    next_tag: u32,
}

impl Harness {
    fn new(keys: &[u8], options: SortOptions) -> Self {
        let store: Rc<ListStore<Item>> = Rc::new(
            keys.iter()
                .zip(0..)
                .map(|(key, tag)| (*key, tag))
                .collect(),
        );
        let sorter = Rc::new(CustomSorter::new(|a: &Item, b: &Item| a.0.cmp(&b.0)));
        let model =
            SortListModel::<Item>::with_options(Some(store.clone()), Some(sorter), options);

        let mirror = Rc::new(RefCell::new(model.snapshot()));
        let changes = Rc::new(RefCell::new(Vec::new()));
        let weak = Rc::downgrade(&model);
        let mirror_sink = Rc::clone(&mirror);
        let change_sink = Rc::clone(&changes);
        model.items_changed().connect(move |change| {
            let Some(model) = weak.upgrade() else {
                return;
            };
            let before = mirror_sink.borrow().clone();
            let added: Vec<Item> = (change.position..change.position + change.added)
                .filter_map(|position| model.item(position))
                .collect();
            mirror_sink
                .borrow_mut()
                .splice(change.position..change.position + change.removed, added);
            change_sink.borrow_mut().push((before, *change));
        });

        Self {
            store,
            model,
            mirror,
            changes,
            next_tag: u32::try_from(keys.len()).unwrap_or(u32::MAX),
        }
    }

    fn apply(&mut self, (position_seed, removal_seed, keys): &Edit) {
        let len = self.store.len();
        let position = position_seed % (len + 1);
        let removed = removal_seed % (len - position + 1);
        let additions: Vec<Item> = keys
            .iter()
            .map(|key| {
                self.next_tag += 1;
                (*key, self.next_tag)
            })
            .collect();
        self.store
            .splice(position, removed, additions)
            .expect("edit stays in range");
    }

    fn expected(&self) -> Vec<Item> {
        let mut items = self.store.snapshot();
        items.sort_by_key(|item| item.0);
        items
    }
}

/// The exact window between the common prefix and suffix of two sequences.
fn diff_window(old: &[Item], new: &[Item]) -> Option<ItemsChanged> {
    let before = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    if before == old.len() && before == new.len() {
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

fn keys() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0..8_u8, 0..64)
}

fn edits() -> impl Strategy<Value = Vec<Edit>> {
    prop::collection::vec(
        (
            any::<usize>(),
            any::<usize>(),
            prop::collection::vec(0..8_u8, 0..6),
        ),
        1..24,
    )
}

proptest! {
    #[test]
    fn prop_model_is_stable_sort_of_source(keys in keys(), edits in edits()) {
        let mut harness = Harness::new(&keys, SortOptions::default());
        prop_assert_eq!(harness.model.snapshot(), harness.expected());

        for edit in &edits {
            harness.apply(edit);
            prop_assert_eq!(harness.model.snapshot(), harness.expected());
        }
    }

    #[test]
    fn prop_count_follows_source(keys in keys(), edits in edits()) {
        let mut harness = Harness::new(&keys, SortOptions::default());

        for edit in &edits {
            harness.apply(edit);
            prop_assert_eq!(harness.model.n_items(), harness.store.len());
            prop_assert_eq!(harness.model.item(harness.store.len()), None);
        }
    }

    #[test]
    fn prop_notifications_replay_to_model(keys in keys(), edits in edits()) {
        let mut harness = Harness::new(&keys, SortOptions::default());

        for edit in &edits {
            harness.apply(edit);
            prop_assert_eq!(&*harness.mirror.borrow(), &harness.model.snapshot());
        }
    }

    #[test]
    fn prop_notifications_are_minimal(keys in keys(), edits in edits()) {
        let mut harness = Harness::new(&keys, SortOptions::default());

        for edit in &edits {
            harness.apply(edit);
        }
        harness.model.set_sorter(Some(Rc::new(CustomSorter::new(|a: &Item, b: &Item| {
            b.0.cmp(&a.0)
        }))));

        let mirror = harness.mirror.borrow().clone();
        let changes = harness.changes.borrow();
        let mut replayed = changes.iter().skip(1).map(|(before, _)| before.clone());
        for (before, change) in changes.iter() {
            let after = replayed.next().unwrap_or_else(|| mirror.clone());
            prop_assert_eq!(Some(*change), diff_window(before, &after));
        }
    }

    #[test]
    fn prop_clearing_sorter_restores_source_order(keys in keys(), edits in edits()) {
        let mut harness = Harness::new(&keys, SortOptions::default());
        for edit in &edits {
            harness.apply(edit);
        }

        harness.model.set_sorter(None);

        prop_assert_eq!(harness.model.snapshot(), harness.store.snapshot());
        prop_assert_eq!(&*harness.mirror.borrow(), &harness.store.snapshot());
    }

    #[test]
    fn prop_incremental_sort_matches_sync_sort(
        keys in keys(),
        edits in edits(),
        budget in 1_usize..32,
        steps_between in 0_usize..4,
    ) {
        let options = SortOptions::default()
            .with_incremental(true)
            .with_step_budget(budget);
        let mut harness = Harness::new(&keys, options);

        for edit in &edits {
            for _ in 0..steps_between {
                harness.model.step();
            }
            harness.apply(edit);

            let mut seen = harness.model.snapshot();
            let mut source = harness.store.snapshot();
            seen.sort_unstable();
            source.sort_unstable();
            prop_assert_eq!(seen, source);
            prop_assert_eq!(&*harness.mirror.borrow(), &harness.model.snapshot());
        }

        while harness.model.step() {}
        prop_assert_eq!(harness.model.pending(), 0);
        prop_assert_eq!(harness.model.snapshot(), harness.expected());
        prop_assert_eq!(&*harness.mirror.borrow(), &harness.model.snapshot());
    }
}
