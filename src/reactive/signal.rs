//! State cells: the writable leaves of the reactive graph.
//!
//! A [`StateCell`] holds a current value and the set of subscribers that
//! read it during their last run. `set` compares against the current value
//! (when the element type has equality), stores, snapshots the subscriber
//! set under the cell's lock, and notifies after the lock is released —
//! a subscriber that writes another cell from its callback never re-enters
//! this cell's lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::graph::{
    next_dependency_id, track_read, Dependency, DependencyId, Gettable, Subscriber, SubscriberId,
    ToValue, Value,
};

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Create a state cell with the given initial value.
///
/// Setting an equal value does not notify subscribers. Use [`opaque_cell`]
/// for element types without a meaningful equality.
pub fn cell<T>(initial: T) -> StateCell<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    StateCell::with_eq(initial, Some(|a: &T, b: &T| a == b))
}

/// Create a state cell whose `set` always propagates.
///
/// For values where equality is not defined (or is not cheap to decide),
/// every `set` notifies; the cell never compares and never deep-traverses.
pub fn opaque_cell<T>(initial: T) -> StateCell<T>
where
    T: Clone + Send + 'static,
{
    StateCell::with_eq(initial, None)
}

// ---------------------------------------------------------------------------
// StateCell
// ---------------------------------------------------------------------------

struct CellState<T> {
    value: T,
    subscribers: HashMap<SubscriberId, Arc<dyn Subscriber>>,
}

pub(crate) struct CellInner<T> {
    id: DependencyId,
    eq: Option<fn(&T, &T) -> bool>,
    state: Mutex<CellState<T>>,
}

/// A reactive state holder. Cheap to clone; clones share the same cell.
pub struct StateCell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell").field("id", &self.inner.id).finish()
    }
}

impl<T: Clone + Send + 'static> StateCell<T> {
    fn with_eq(initial: T, eq: Option<fn(&T, &T) -> bool>) -> Self {
        Self {
            inner: Arc::new(CellInner {
                id: next_dependency_id(),
                eq,
                state: Mutex::new(CellState {
                    value: initial,
                    subscribers: HashMap::new(),
                }),
            }),
        }
    }

    /// Read the current value, subscribing the running subscriber (if any).
    pub fn get(&self) -> T {
        track_read(&self.inner);
        self.inner.state.lock().value.clone()
    }

    /// Read the current value without tracking.
    pub fn peek(&self) -> T {
        self.inner.state.lock().value.clone()
    }

    /// Store a new value and notify subscribers.
    ///
    /// When the element type has equality and the new value equals the
    /// current one, nothing happens.
    pub fn set(&self, value: T) {
        let subs = {
            let mut state = self.inner.state.lock();
            if let Some(eq) = self.inner.eq {
                if eq(&state.value, &value) {
                    return;
                }
            }
            state.value = value;
            state.subscribers.values().cloned().collect::<Vec<_>>()
        };
        for sub in subs {
            sub.on_dependency_updated();
        }
    }

    /// Mutate the value in place and notify subscribers unconditionally.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let subs = {
            let mut state = self.inner.state.lock();
            f(&mut state.value);
            state.subscribers.values().cloned().collect::<Vec<_>>()
        };
        for sub in subs {
            sub.on_dependency_updated();
        }
    }
}

impl<T: Send + 'static> Dependency for CellInner<T> {
    fn dep_id(&self) -> DependencyId {
        self.id
    }

    fn subscribe(&self, sub: Arc<dyn Subscriber>) {
        self.state.lock().subscribers.insert(sub.sub_id(), sub);
    }

    fn unsubscribe(&self, id: SubscriberId) {
        self.state.lock().subscribers.remove(&id);
    }
}

impl<T> Gettable for StateCell<T>
where
    T: ToValue + Clone + Send + Sync + 'static,
{
    fn get_value(&self) -> Value {
        self.get().to_value()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
