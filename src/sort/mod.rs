//! A list model presenting another list model in sorted order.
//!
//! [`SortListModel`] observes a source [`ListModel`] and keeps a stably
//! sorted projection of it: items that compare equal keep their source
//! order. It is itself a [`ListModel`], so it can be used anywhere a plain
//! list is expected, including as the source of another sorted model.
//!
//! # Incremental sorting
//!
//! Resorting a large model (after attaching it, or after the sorter changed)
//! can take longer than a host event loop should block. With
//! [`set_incremental(true)`](SortListModel::set_incremental) such resorts run
//! as a resumable merge sort, advanced one bounded slice at a time by
//! [`step`](SortListModel::step). Until [`pending`](SortListModel::pending)
//! drops to zero the model exposes its previous order, with every item still
//! present exactly once.
//!
//! Changes of the source while a sort is in flight are applied at once (new
//! items go to the end) and the sort restarts from the updated state.
//!
//! ```text
//!            resort, incremental, n > 1
//!     Idle ─────────────────────────────► Running ◄──┐ step / source change
//!       ▲                                    │  └─────┘
//!       │ pending == 0, set_incremental(false), model or sorter cleared
//!       └────────────────────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust
//! use std::rc::Rc;
//! use sortlist::model::{ListModel, ListStore};
//! use sortlist::sort::SortListModel;
//! use sortlist::sorter::CustomSorter;
//!
//! let store = Rc::new(ListStore::from_iter([4, 8, 2, 6, 10]));
//! let sorter = Rc::new(CustomSorter::new(|a: &i32, b: &i32| a.cmp(b)));
//! let model = SortListModel::<i32>::new(Some(store.clone()), Some(sorter));
//! assert_eq!(model.snapshot(), vec![2, 4, 6, 8, 10]);
//!
//! store.append(5);
//! assert_eq!(model.snapshot(), vec![2, 4, 5, 6, 8, 10]);
//! ```

mod driver;
mod options;
mod projection;
mod sequence;

pub use options::{DEFAULT_STEP_BUDGET, SortOptions};

use crate::model::{ItemsChanged, ListModel};
use crate::signal::{HandlerId, Signal};
use crate::sorter::{Sorter, SorterChange};
use driver::MergeSort;
use projection::{Comparator, Projection};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::{Rc, Weak};

static_assertions::assert_not_impl_any!(SortListModel<u32>: Send, Sync);

/// Observable properties of a [`SortListModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Property {
    /// The source model was replaced.
    Model,
    /// The sorter was replaced.
    Sorter,
    /// The section sorter was replaced.
    SectionSorter,
    /// Incremental sorting was switched on or off.
    Incremental,
    /// The amount of pending sort work changed.
    Pending,
    /// The number of items changed.
    NItems,
}

/// What to tell observers once the state borrow is released.
#[derive(Default)]
struct Notifications {
    change: Option<ItemsChanged>,
    properties: SmallVec<[Property; 4]>,
}

impl Notifications {
    fn property(&mut self, property: Property) {
        if !self.properties.contains(&property) {
            self.properties.push(property);
        }
    }
}

struct Connection<S: ?Sized> {
    target: Rc<S>,
    handler: HandlerId,
}

struct State<T> {
    model: Option<Connection<dyn ListModel<T>>>,
    sorter: Option<Connection<dyn Sorter<T>>>,
    section_sorter: Option<Connection<dyn Sorter<T>>>,
    options: SortOptions,
    /// `None` while the model passes the source order through.
    projection: Option<Projection<T>>,
    sort: Option<MergeSort>,
}

impl<T: Clone> State<T> {
    fn comparator(&self) -> Comparator<T> {
        Comparator::new(
            self.section_sorter
                .as_ref()
                .map(|connection| Rc::clone(&connection.target)),
            self.sorter
                .as_ref()
                .map(|connection| Rc::clone(&connection.target)),
        )
    }

    fn n_items(&self) -> usize {
        match (&self.projection, &self.model) {
            (Some(projection), _) => projection.len(),
            (None, Some(model)) => model.target.n_items(),
            (None, None) => 0,
        }
    }

    fn pending(&self) -> usize {
        self.sort.as_ref().map_or(0, MergeSort::pending)
    }

    /// Sorts the projection, incrementally if configured to.
    fn start_sorting(&mut self, notifications: &mut Notifications) {
        let comparator = self.comparator();
        let Some(projection) = self.projection.as_mut() else {
            return;
        };
        if self.options.incremental() && projection.len() > 1 {
            let sort = MergeSort::new(projection.sort_keys());
            tracing::debug!(
                items = sort.len(),
                pending = sort.pending(),
                restart = self.sort.is_some(),
                "sort_list_model.sort.start"
            );
            self.sort = Some(sort);
            notifications.property(Property::Pending);
        } else {
            if self.sort.take().is_some() {
                tracing::debug!("sort_list_model.sort.cancel");
                notifications.property(Property::Pending);
            }
            debug_assert!(notifications.change.is_none());
            notifications.change = projection.sort(&comparator);
            tracing::trace!(items = projection.len(), "sort_list_model.sort.sync");
        }
    }

    fn stop_sorting(&mut self, notifications: &mut Notifications) {
        if self.sort.take().is_some() {
            tracing::debug!("sort_list_model.sort.cancel");
            notifications.property(Property::Pending);
        }
    }

    /// Runs one slice of the pending sort.
    fn sort_step(&mut self, budget: usize, notifications: &mut Notifications) -> bool {
        let comparator = self.comparator();
        let (Some(projection), Some(sort)) = (self.projection.as_mut(), self.sort.as_mut()) else {
            return false;
        };
        let more = sort.step(budget, |first, second| {
            projection.compare_keys(&comparator, first, second)
        });
        notifications.property(Property::Pending);
        if more {
            tracing::trace!(pending = sort.pending(), "sort_list_model.sort.step");
            return true;
        }

        if let Some(sort) = self.sort.take() {
            notifications.change = projection.apply_order(sort.into_sorted());
            tracing::debug!(
                items = projection.len(),
                changed = ?notifications.change,
                "sort_list_model.sort.finish"
            );
        }
        false
    }

    /// Creates or drops the projection to match the current sorters, and
    /// sorts it.
    fn resort(&mut self, notifications: &mut Notifications) {
        let comparator = self.comparator();
        let should_sort = self.model.is_some() && comparator.sorts();

        match (should_sort, self.projection.is_some()) {
            (false, false) => {}
            (false, true) => {
                self.stop_sorting(notifications);
                notifications.change = self
                    .projection
                    .take()
                    .and_then(|projection| projection.unsort_change());
            }
            (true, has_projection) => {
                if !has_projection {
                    let items = self
                        .model
                        .as_ref()
                        .map(|model| model.target.snapshot())
                        .unwrap_or_default();
                    self.projection = Some(Projection::from_items(items));
                }
                self.start_sorting(notifications);
            }
        }
    }
}

/// A stably sorted view of another list model.
///
/// See the [module documentation](self) for the incremental sorting
/// protocol.
pub struct SortListModel<T> {
    this: Weak<Self>,
    state: RefCell<State<T>>,
    items_changed: Signal<ItemsChanged>,
    notify: Signal<Property>,
}

impl<T: Clone + 'static> SortListModel<T> {
    /// Creates a model sorting `model` with `sorter`, non-incrementally.
    pub fn new(
        model: Option<Rc<dyn ListModel<T>>>,
        sorter: Option<Rc<dyn Sorter<T>>>,
    ) -> Rc<Self> {
        Self::with_options(model, sorter, SortOptions::default())
    }

    /// Creates a model with explicit options.
    pub fn with_options(
        model: Option<Rc<dyn ListModel<T>>>,
        sorter: Option<Rc<dyn Sorter<T>>>,
        options: SortOptions,
    ) -> Rc<Self> {
        let this = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            state: RefCell::new(State {
                model: None,
                sorter: None,
                section_sorter: None,
                options,
                projection: None,
                sort: None,
            }),
            items_changed: Signal::new(),
            notify: Signal::new(),
        });
        {
            let mut state = this.state.borrow_mut();
            state.sorter = sorter.map(|sorter| this.watch_sorter(sorter, false));
            state.model = model.map(|model| this.watch_model(model));
            let mut ignored = Notifications::default();
            state.resort(&mut ignored);
        }
        this
    }

    /// The source model.
    pub fn model(&self) -> Option<Rc<dyn ListModel<T>>> {
        self.state
            .borrow()
            .model
            .as_ref()
            .map(|model| Rc::clone(&model.target))
    }

    /// Replaces the source model.
    ///
    /// The old and new contents are announced as a single change replacing
    /// everything. Setting the model that is already set does nothing.
    pub fn set_model(&self, model: Option<Rc<dyn ListModel<T>>>) {
        let mut notifications = Notifications::default();
        {
            let mut state = self.state.borrow_mut();
            let unchanged = match (&state.model, &model) {
                (Some(current), Some(new)) => same_target(&current.target, new),
                (None, None) => true,
                _ => false,
            };
            if unchanged {
                return;
            }

            let n_before = state.n_items();
            state.stop_sorting(&mut notifications);
            if let Some(old) = state.model.take() {
                unwatch(&old, |target| target.items_changed());
            }
            state.projection = None;
            state.model = model.map(|model| self.watch_model(model));
            state.resort(&mut notifications);

            let n_after = state.n_items();
            notifications.change = (n_before > 0 || n_after > 0)
                .then(|| ItemsChanged::new(0, n_before, n_after));
            notifications.property(Property::Model);
            if n_before != n_after {
                notifications.property(Property::NItems);
            }
            tracing::debug!(n_before, n_after, "sort_list_model.model.set");
        }
        self.dispatch(notifications);
    }

    /// The sorter.
    pub fn sorter(&self) -> Option<Rc<dyn Sorter<T>>> {
        self.state
            .borrow()
            .sorter
            .as_ref()
            .map(|sorter| Rc::clone(&sorter.target))
    }

    /// Replaces the sorter and resorts. `None` restores the source order,
    /// unless a section sorter is set.
    pub fn set_sorter(&self, sorter: Option<Rc<dyn Sorter<T>>>) {
        self.replace_sorter(sorter, false);
    }

    /// The section sorter.
    pub fn section_sorter(&self) -> Option<Rc<dyn Sorter<T>>> {
        self.state
            .borrow()
            .section_sorter
            .as_ref()
            .map(|sorter| Rc::clone(&sorter.target))
    }

    /// Replaces the section sorter and resorts.
    ///
    /// Items are ordered by the section sorter first and by the sorter
    /// second; see [`section`](Self::section).
    pub fn set_section_sorter(&self, sorter: Option<Rc<dyn Sorter<T>>>) {
        self.replace_sorter(sorter, true);
    }

    /// Whether resorts run incrementally.
    pub fn incremental(&self) -> bool {
        self.state.borrow().options.incremental()
    }

    /// Switches incremental sorting on or off.
    ///
    /// Switching it off while a sort is pending finishes that sort before
    /// returning.
    pub fn set_incremental(&self, incremental: bool) {
        let mut notifications = Notifications::default();
        {
            let mut state = self.state.borrow_mut();
            if state.options.incremental() == incremental {
                return;
            }
            state.options = state.options.with_incremental(incremental);
            notifications.property(Property::Incremental);
            if !incremental && state.sort.is_some() {
                tracing::debug!(pending = state.pending(), "sort_list_model.sort.drain");
                state.sort_step(usize::MAX, &mut notifications);
            }
        }
        self.dispatch(notifications);
    }

    /// The options the model was created with, reflecting later changes.
    pub fn options(&self) -> SortOptions {
        self.state.borrow().options
    }

    /// Estimate of the sort work left; `0` when the model is fully sorted.
    pub fn pending(&self) -> usize {
        self.state.borrow().pending()
    }

    /// Advances a pending incremental sort by one slice.
    ///
    /// Returns `true` while more work remains. Observers are told about the
    /// new order once, when the last slice completes.
    pub fn step(&self) -> bool {
        let mut notifications = Notifications::default();
        let more = {
            let mut state = self.state.borrow_mut();
            let budget = state.options.step_budget();
            state.sort_step(budget, &mut notifications)
        };
        self.dispatch(notifications);
        more
    }

    /// Finishes any pending sort synchronously.
    pub fn run_to_completion(&self) {
        let mut notifications = Notifications::default();
        {
            let mut state = self.state.borrow_mut();
            if state.sort.is_some() {
                state.sort_step(usize::MAX, &mut notifications);
            }
        }
        self.dispatch(notifications);
    }

    /// Drives a pending sort to completion, yielding to the scheduler
    /// between slices.
    #[cfg(feature = "async")]
    pub async fn sort_async(&self) {
        while self.step() {
            tokio::task::yield_now().await;
        }
    }

    /// The section containing `position`: the maximal range of neighbours
    /// the section sorter considers equal.
    ///
    /// Without a section sorter the whole model is one section. Returns
    /// `None` if `position` is out of range.
    pub fn section(&self, position: usize) -> Option<Range<usize>> {
        let state = self.state.borrow();
        let n_items = state.n_items();
        if position >= n_items {
            return None;
        }
        match (&state.projection, &state.section_sorter) {
            (Some(projection), Some(section_sorter)) => {
                projection.section(position, section_sorter.target.as_ref())
            }
            _ => Some(0..n_items),
        }
    }

    /// Property change notifications.
    pub fn notify(&self) -> &Signal<Property> {
        &self.notify
    }

    fn replace_sorter(&self, sorter: Option<Rc<dyn Sorter<T>>>, section: bool) {
        let mut notifications = Notifications::default();
        {
            let mut state = self.state.borrow_mut();
            let slot = if section {
                &mut state.section_sorter
            } else {
                &mut state.sorter
            };
            let unchanged = match (&*slot, &sorter) {
                (Some(current), Some(new)) => same_target(&current.target, new),
                (None, None) => true,
                _ => false,
            };
            if unchanged {
                return;
            }
            if let Some(old) = slot.take() {
                unwatch(&old, |target| target.changed());
            }
            *slot = sorter.map(|sorter| self.watch_sorter(sorter, section));

            state.resort(&mut notifications);
            notifications.property(if section {
                Property::SectionSorter
            } else {
                Property::Sorter
            });
        }
        self.dispatch(notifications);
    }

    fn watch_model(&self, model: Rc<dyn ListModel<T>>) -> Connection<dyn ListModel<T>> {
        let this = self.this.clone();
        let handler = model.items_changed().connect(move |change| {
            if let Some(this) = this.upgrade() {
                this.source_changed(*change);
            }
        });
        Connection {
            target: model,
            handler,
        }
    }

    fn watch_sorter(&self, sorter: Rc<dyn Sorter<T>>, section: bool) -> Connection<dyn Sorter<T>> {
        let this = self.this.clone();
        let handler = sorter.changed().connect(move |change| {
            if let Some(this) = this.upgrade() {
                this.sorter_changed(*change, section);
            }
        });
        Connection {
            target: sorter,
            handler,
        }
    }

    fn sorter_changed(&self, change: SorterChange, section: bool) {
        let mut notifications = Notifications::default();
        {
            let mut state = self.state.borrow_mut();
            tracing::debug!(?change, section, "sort_list_model.sorter.changed");
            state.resort(&mut notifications);
        }
        self.dispatch(notifications);
    }

    fn source_changed(&self, change: ItemsChanged) {
        let mut notifications = Notifications::default();
        if change.changes_len() {
            notifications.property(Property::NItems);
        }

        let (model, sorted) = {
            let state = self.state.borrow();
            (
                state.model.as_ref().map(|model| Rc::clone(&model.target)),
                state.projection.is_some(),
            )
        };
        let Some(model) = model else {
            return;
        };
        if !sorted {
            notifications.change = Some(change);
            self.dispatch(notifications);
            return;
        }

        let added: Vec<T> = (change.position..change.position + change.added)
            .filter_map(|position| model.item(position))
            .collect();
        debug_assert_eq!(added.len(), change.added);

        {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let pending_before = state.pending();
            let comparator = state.comparator();
            // Single insertions are always placed directly.
            let defer = state.sort.is_some()
                || (state.options.incremental()
                    && change.added > 1
                    && change.added >= state.options.step_budget());

            if let Some(projection) = state.projection.as_mut() {
                notifications.change = projection.splice(
                    change.position,
                    change.removed,
                    added,
                    (!defer).then_some(&comparator),
                );
                let sortable = projection.len() > 1;
                if defer && sortable {
                    state.start_sorting(&mut notifications);
                } else if defer {
                    state.stop_sorting(&mut notifications);
                }
            }
            if state.pending() != pending_before {
                notifications.property(Property::Pending);
            }
        }
        self.dispatch(notifications);
    }

    fn dispatch(&self, notifications: Notifications) {
        if let Some(change) = notifications.change.filter(|change| !change.is_empty()) {
            self.items_changed.emit(&change);
        }
        for property in notifications.properties {
            self.notify.emit(&property);
        }
    }
}

impl<T: Clone + 'static> ListModel<T> for SortListModel<T> {
    fn n_items(&self) -> usize {
        self.state.borrow().n_items()
    }

    fn item(&self, position: usize) -> Option<T> {
        let state = self.state.borrow();
        match (&state.projection, &state.model) {
            (Some(projection), _) => projection.item(position).cloned(),
            (None, Some(model)) => model.target.item(position),
            (None, None) => None,
        }
    }

    fn items_changed(&self) -> &Signal<ItemsChanged> {
        &self.items_changed
    }

    fn snapshot(&self) -> Vec<T> {
        let state = self.state.borrow();
        match (&state.projection, &state.model) {
            (Some(projection), _) => projection.items(),
            (None, Some(model)) => model.target.snapshot(),
            (None, None) => Vec::new(),
        }
    }
}

impl<T> Drop for SortListModel<T> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        state.sort = None;
        if let Some(model) = state.model.take() {
            unwatch(&model, |target| target.items_changed());
        }
        for sorter in [state.sorter.take(), state.section_sorter.take()]
            .into_iter()
            .flatten()
        {
            unwatch(&sorter, |target| target.changed());
        }
    }
}

impl<T> fmt::Debug for SortListModel<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        formatter
            .debug_struct("SortListModel")
            .field("has_model", &state.model.is_some())
            .field("has_sorter", &state.sorter.is_some())
            .field("sorted", &state.projection.is_some())
            .field("options", &state.options)
            .field("pending", &state.sort.as_ref().map_or(0, MergeSort::pending))
            .finish_non_exhaustive()
    }
}

fn unwatch<S: ?Sized, A>(connection: &Connection<S>, signal: impl Fn(&S) -> &Signal<A>) {
    signal(connection.target.as_ref()).disconnect(connection.handler);
}

fn same_target<S: ?Sized>(current: &Rc<S>, new: &Rc<S>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(current), Rc::as_ptr(new))
}
