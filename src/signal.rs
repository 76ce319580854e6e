//! Typed, single-threaded signals.
//!
//! A [`Signal`] is a list of handlers that are invoked, in connection order,
//! every time the signal is emitted. It is the observer mechanism used by
//! list models ([`ItemsChanged`](crate::model::ItemsChanged)), sorters
//! ([`SorterChange`](crate::sorter::SorterChange)) and
//! [`SortListModel`](crate::sort::SortListModel) property notifications.
//!
//! # Reentrancy
//!
//! Emission works on a snapshot of the handler list. A handler may therefore
//! connect new handlers, disconnect handlers (including itself) or call back
//! into the object that is emitting. Handlers connected during an emission
//! are first invoked by the next emission; handlers disconnected during an
//! emission are not invoked for the rest of it.
//!
//! # Examples
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use sortlist::signal::Signal;
//!
//! let signal: Signal<u32> = Signal::new();
//! let total = Rc::new(Cell::new(0));
//!
//! let sink = Rc::clone(&total);
//! let handler = signal.connect(move |value| sink.set(sink.get() + value));
//!
//! signal.emit(&3);
//! signal.emit(&4);
//! assert_eq!(total.get(), 7);
//!
//! assert!(signal.disconnect(handler));
//! signal.emit(&100);
//! assert_eq!(total.get(), 7);
//! ```

use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Most signals carry one or two handlers; keep emission snapshots inline.
const INLINE_HANDLERS: usize = 4;

/// Identifies a connected handler within the [`Signal`] that returned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

type Handler<A> = Rc<dyn Fn(&A)>;

struct Slot<A> {
    id: HandlerId,
    handler: Handler<A>,
    live: Rc<Cell<bool>>,
}

/// A list of handlers invoked with a shared reference to the emitted value.
pub struct Signal<A> {
    slots: RefCell<Vec<Slot<A>>>,
    next_id: Cell<u64>,
}

impl<A> Signal<A> {
    /// Creates a signal without handlers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Connects `handler`, returning the id needed to disconnect it.
    pub fn connect<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&A) + 'static,
    {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.slots.borrow_mut().push(Slot {
            id,
            handler: Rc::new(handler),
            live: Rc::new(Cell::new(true)),
        });
        id
    }

    /// Disconnects the handler with the given id.
    ///
    /// Returns `false` if no such handler is connected.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        let mut slots = self.slots.borrow_mut();
        match slots.iter().position(|slot| slot.id == id) {
            Some(index) => {
                let slot = slots.remove(index);
                slot.live.set(false);
                true
            }
            None => false,
        }
    }

    /// Disconnects every handler.
    pub fn disconnect_all(&self) {
        for slot in self.slots.borrow_mut().drain(..) {
            slot.live.set(false);
        }
    }

    /// Number of connected handlers.
    pub fn handler_count(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Invokes every connected handler with `value`.
    pub fn emit(&self, value: &A) {
        let snapshot: SmallVec<[(Handler<A>, Rc<Cell<bool>>); INLINE_HANDLERS]> = self
            .slots
            .borrow()
            .iter()
            .map(|slot| (Rc::clone(&slot.handler), Rc::clone(&slot.live)))
            .collect();

        for (handler, live) in snapshot {
            if live.get() {
                handler(value);
            }
        }
    }
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Signal<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Signal")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
