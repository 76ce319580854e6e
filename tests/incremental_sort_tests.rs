//! Tests for incremental sorting: pending work, stepping, draining, and
//! source changes arriving while a sort is in flight.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rstest::{fixture, rstest};
use sortlist::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

// =============================================================================
// Helpers
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn ascending() -> Rc<CustomSorter<u32>> {
    Rc::new(CustomSorter::new(|a: &u32, b: &u32| a.cmp(b)))
}

/// An ascending sorter that counts every comparison it makes.
fn counting() -> (Rc<CustomSorter<u32>>, Rc<Cell<usize>>) {
    let comparisons = Rc::new(Cell::new(0));
    let counter = Rc::clone(&comparisons);
    let sorter = CustomSorter::new(move |a: &u32, b: &u32| {
        counter.set(counter.get() + 1);
        a.cmp(b)
    });
    (Rc::new(sorter), comparisons)
}

fn incremental(budget: usize) -> SortOptions {
    SortOptions::default()
        .with_incremental(true)
        .with_step_budget(budget)
}

fn record_changes(model: &SortListModel<u32>) -> Rc<RefCell<Vec<ItemsChanged>>> {
    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&changes);
    model
        .items_changed()
        .connect(move |change| sink.borrow_mut().push(*change));
    changes
}

fn record_properties(model: &SortListModel<u32>) -> Rc<RefCell<Vec<Property>>> {
    let properties = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&properties);
    model
        .notify()
        .connect(move |property| sink.borrow_mut().push(*property));
    properties
}

fn sorted_copy(values: &[u32]) -> Vec<u32> {
    let mut values = values.to_vec();
    values.sort_unstable();
    values
}

#[fixture]
fn reversed() -> Rc<ListStore<u32>> {
    Rc::new((0..1000).rev().collect())
}

// =============================================================================
// Pending work
// =============================================================================

#[rstest]
fn test_incremental_attach_starts_pending_sort(reversed: Rc<ListStore<u32>>) {
    let model = SortListModel::<u32>::with_options(
        Some(reversed.clone()),
        Some(ascending()),
        incremental(64),
    );

    assert!(model.pending() > 0);
    assert_eq!(model.snapshot(), reversed.snapshot());
}

#[rstest]
fn test_pending_decreases_until_sorted(reversed: Rc<ListStore<u32>>) {
    let model = SortListModel::<u32>::with_options(
        Some(reversed.clone()),
        Some(ascending()),
        incremental(64),
    );
    let changes = record_changes(&model);

    let mut previous = model.pending();
    let mut steps = 0;
    while model.step() {
        steps += 1;
        assert!(model.pending() < previous);
        previous = model.pending();
        assert!(changes.borrow().is_empty());
    }

    assert!(steps > 1);
    assert_eq!(model.pending(), 0);
    assert!(!model.step());
    assert_eq!(model.snapshot(), (0..1000).collect::<Vec<_>>());
    assert_eq!(*changes.borrow(), vec![ItemsChanged::new(0, 1000, 1000)]);
}

#[rstest]
fn test_step_notifies_pending() {
    let store: Rc<ListStore<u32>> = Rc::new([3, 1, 2].into_iter().collect());
    let model =
        SortListModel::<u32>::with_options(Some(store.clone()), Some(ascending()), incremental(1));
    let properties = record_properties(&model);

    model.step();

    assert_eq!(*properties.borrow(), vec![Property::Pending]);
}

#[rstest]
#[case::empty(vec![])]
#[case::single(vec![7])]
fn test_trivial_models_never_pend(#[case] values: Vec<u32>) {
    let store: Rc<ListStore<u32>> = Rc::new(values.iter().copied().collect());
    let model =
        SortListModel::<u32>::with_options(Some(store.clone()), Some(ascending()), incremental(1));

    assert_eq!(model.pending(), 0);
    assert!(!model.step());
    assert_eq!(model.snapshot(), values);
}

#[rstest]
fn test_switching_incremental_on_does_not_start_sort(reversed: Rc<ListStore<u32>>) {
    let model = SortListModel::<u32>::new(Some(reversed.clone()), Some(ascending()));
    let properties = record_properties(&model);

    model.set_incremental(true);

    assert_eq!(model.pending(), 0);
    assert_eq!(model.item(0), Some(0));
    assert_eq!(*properties.borrow(), vec![Property::Incremental]);
}

#[rstest]
fn test_switching_incremental_off_drains_pending_sort(reversed: Rc<ListStore<u32>>) {
    init_tracing();
    let model = SortListModel::<u32>::with_options(
        Some(reversed.clone()),
        Some(ascending()),
        incremental(16),
    );
    model.step();
    let changes = record_changes(&model);
    let properties = record_properties(&model);

    model.set_incremental(false);

    assert!(!model.incremental());
    assert_eq!(model.pending(), 0);
    assert_eq!(model.snapshot(), (0..1000).collect::<Vec<_>>());
    assert_eq!(*changes.borrow(), vec![ItemsChanged::new(0, 1000, 1000)]);
    assert_eq!(
        *properties.borrow(),
        vec![Property::Incremental, Property::Pending]
    );
}

#[rstest]
fn test_run_to_completion_finishes_sort(reversed: Rc<ListStore<u32>>) {
    let model = SortListModel::<u32>::with_options(
        Some(reversed.clone()),
        Some(ascending()),
        incremental(16),
    );

    model.run_to_completion();

    assert_eq!(model.pending(), 0);
    assert!(model.incremental());
    assert_eq!(model.item(999), Some(999));
}

#[rstest]
fn test_clearing_sorter_cancels_pending_sort(reversed: Rc<ListStore<u32>>) {
    let model = SortListModel::<u32>::with_options(
        Some(reversed.clone()),
        Some(ascending()),
        incremental(16),
    );
    model.step();

    model.set_sorter(None);

    assert_eq!(model.pending(), 0);
    assert_eq!(model.snapshot(), reversed.snapshot());
}

#[rstest]
fn test_detaching_source_mid_sort_discards_pending_sort(reversed: Rc<ListStore<u32>>) {
    init_tracing();
    let (sorter, comparisons) = counting();
    let model = SortListModel::<u32>::with_options(
        Some(reversed.clone()),
        Some(sorter.clone()),
        incremental(16),
    );
    assert!(model.step());
    let compared = comparisons.get();
    assert!(compared > 0);

    model.set_model(None);

    assert_eq!(model.pending(), 0);
    assert!(!model.step());
    assert_eq!(model.n_items(), 0);
    assert_eq!(reversed.items_changed().handler_count(), 0);

    reversed.append(5000);
    model.run_to_completion();
    assert_eq!(model.n_items(), 0);
    assert_eq!(comparisons.get(), compared);
}

#[rstest]
fn test_dropping_model_mid_sort_stops_comparing(reversed: Rc<ListStore<u32>>) {
    let (sorter, comparisons) = counting();
    let model = SortListModel::<u32>::with_options(
        Some(reversed.clone()),
        Some(sorter.clone()),
        incremental(16),
    );
    assert!(model.step());
    assert!(model.pending() > 0);
    let compared = comparisons.get();

    drop(model);

    assert_eq!(reversed.items_changed().handler_count(), 0);
    assert_eq!(sorter.changed().handler_count(), 0);
    reversed.extend([5000, 5001]);
    reversed.remove(0).expect("store is not empty");
    sorter.notify_changed(SorterChange::Different);
    assert_eq!(comparisons.get(), compared);
}

#[rstest]
fn test_zero_step_budget_behaves_as_one() {
    let store: Rc<ListStore<u32>> = Rc::new((0..10).collect());
    let model =
        SortListModel::<u32>::with_options(Some(store.clone()), Some(ascending()), incremental(0));
    model.run_to_completion();
    let changes = record_changes(&model);

    assert_eq!(model.options().step_budget(), 1);
    store.append(3);

    assert_eq!(model.pending(), 0);
    assert_eq!(model.item(4), Some(3));
    assert_eq!(model.item(10), Some(9));
    assert_eq!(*changes.borrow(), vec![ItemsChanged::new(4, 0, 1)]);
}

// =============================================================================
// Source changes during a sort
// =============================================================================

#[rstest]
fn test_items_stay_present_exactly_once_mid_sort(reversed: Rc<ListStore<u32>>) {
    let model = SortListModel::<u32>::with_options(
        Some(reversed.clone()),
        Some(ascending()),
        incremental(100),
    );

    while model.pending() > 0 {
        let seen: Vec<u32> = (0..model.n_items())
            .map(|position| model.item(position).expect("position in range"))
            .collect();
        assert_eq!(sorted_copy(&seen), (0..1000).collect::<Vec<_>>());
        model.step();
    }
}

#[rstest]
fn test_source_change_mid_sort_appends_and_restarts(reversed: Rc<ListStore<u32>>) {
    init_tracing();
    let model = SortListModel::<u32>::with_options(
        Some(reversed.clone()),
        Some(ascending()),
        incremental(64),
    );
    model.step();
    let changes = record_changes(&model);

    reversed.extend([5000, 5001]);

    assert_eq!(model.n_items(), 1002);
    assert_eq!(model.item(1000), Some(5000));
    assert_eq!(model.item(1001), Some(5001));
    assert_eq!(*changes.borrow(), vec![ItemsChanged::new(1000, 0, 2)]);
    assert!(model.pending() > 0);

    model.run_to_completion();
    let mut expected: Vec<u32> = (0..1000).collect();
    expected.extend([5000, 5001]);
    assert_eq!(model.snapshot(), expected);
}

#[rstest]
fn test_large_insertion_is_sorted_incrementally() {
    let store: Rc<ListStore<u32>> = Rc::new((0..10).collect());
    let model =
        SortListModel::<u32>::with_options(Some(store.clone()), Some(ascending()), incremental(4));
    model.run_to_completion();

    store.extend([3, 2, 1, 0]);

    assert!(model.pending() > 0);
    assert_eq!(model.item(10), Some(3));
    model.run_to_completion();
    assert_eq!(
        model.snapshot(),
        vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 5, 6, 7, 8, 9]
    );
}

#[rstest]
fn test_small_insertion_is_placed_immediately() {
    let store: Rc<ListStore<u32>> = Rc::new((0..10).collect());
    let model =
        SortListModel::<u32>::with_options(Some(store.clone()), Some(ascending()), incremental(4));
    model.run_to_completion();
    let changes = record_changes(&model);

    store.append(3);

    assert_eq!(model.pending(), 0);
    assert_eq!(model.item(4), Some(3));
    assert_eq!(*changes.borrow(), vec![ItemsChanged::new(4, 0, 1)]);
}

#[rstest]
fn test_removing_everything_mid_sort_stops_it(reversed: Rc<ListStore<u32>>) {
    let model = SortListModel::<u32>::with_options(
        Some(reversed.clone()),
        Some(ascending()),
        incremental(64),
    );
    model.step();

    reversed.remove_all();

    assert_eq!(model.n_items(), 0);
    assert_eq!(model.pending(), 0);
    assert!(!model.step());
}

#[rstest]
fn test_hundred_thousand_items_survive_random_removals() {
    const ITEMS: u32 = 100_000;
    init_tracing();
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let store: Rc<ListStore<u32>> = Rc::new((0..ITEMS).map(|_| rng.gen_range(0..ITEMS)).collect());
    let model = SortListModel::<u32>::with_options(
        Some(store.clone()),
        Some(ascending()),
        incremental(4096),
    );

    let mut removals = 0;
    while model.pending() > 0 && removals < 100 {
        let position = rng.gen_range(0..store.len());
        store.remove(position).expect("position in range");
        removals += 1;
        assert_eq!(model.n_items(), store.len());
        model.step();
    }
    model.run_to_completion();

    assert_eq!(removals, 100);
    assert_eq!(model.n_items(), (ITEMS - 100) as usize);
    assert_eq!(model.snapshot(), sorted_copy(&store.snapshot()));
}
