//! Derived cells: lazy, memoized computations over other cells.
//!
//! A [`DerivedCell`] caches its function's result and recomputes only when a
//! dependency has marked it dirty *and* someone reads it. Recomputation
//! drops the old dependency edges, installs the cell as the tracking
//! subscriber, and runs the function with no internal lock held — the
//! function may freely read other cells that take their own locks.
//!
//! A derived cell is both a [`Dependency`] (effects and other derived cells
//! can depend on it) and a [`Subscriber`] (it depends on what its function
//! reads). A dirty notification propagates to its own subscribers without
//! recomputing; the recomputation waits for the next `get`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::graph::{
    detach_from, next_dependency_id, next_subscriber_id, swap_active, track_read, Dependency,
    DependencyId, DependencySet, Gettable, Subscriber, SubscriberId, ToValue, Value,
};

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Create a lazy memoized derivation.
///
/// The function does not run until the first `get`; it re-runs on a `get`
/// that follows a change to any cell it read last time.
pub fn derived<T, F>(f: F) -> DerivedCell<T>
where
    T: Clone + Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    DerivedCell {
        inner: Arc::new(DerivedInner {
            dep_id: next_dependency_id(),
            sub_id: next_subscriber_id(),
            func: Mutex::new(Box::new(f)),
            state: Mutex::new(DerivedState {
                value: None,
                dirty: true,
                dependencies: HashMap::new(),
                subscribers: HashMap::new(),
            }),
        }),
    }
}

// ---------------------------------------------------------------------------
// DerivedCell
// ---------------------------------------------------------------------------

struct DerivedState<T> {
    /// Cached result; `None` only before the first recomputation.
    value: Option<T>,
    dirty: bool,
    dependencies: DependencySet,
    subscribers: HashMap<SubscriberId, Arc<dyn Subscriber>>,
}

pub(crate) struct DerivedInner<T> {
    dep_id: DependencyId,
    sub_id: SubscriberId,
    /// Held only while the user function runs. Dependency cycles are not
    /// detected; a derived cell must not read itself.
    func: Mutex<Box<dyn FnMut() -> T + Send>>,
    state: Mutex<DerivedState<T>>,
}

/// A lazy, memoized cell whose value is a function of other cells.
/// Cheap to clone; clones share the same cell.
pub struct DerivedCell<T> {
    inner: Arc<DerivedInner<T>>,
}

impl<T> Clone for DerivedCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for DerivedCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedCell")
            .field("id", &self.inner.dep_id)
            .finish()
    }
}

impl<T: Clone + Send + 'static> DerivedCell<T> {
    /// Read the value, recomputing first if a dependency changed.
    ///
    /// Subscribes the running subscriber (if any) to this cell, not to the
    /// cells the computation reads — those become dependencies of this cell.
    pub fn get(&self) -> T {
        track_read(&self.inner);
        DerivedInner::resolve(&self.inner)
    }

    /// Read the cached value without tracking, recomputing if dirty.
    pub fn peek(&self) -> T {
        DerivedInner::resolve(&self.inner)
    }
}

impl<T: Clone + Send + 'static> DerivedInner<T> {
    /// Return the up-to-date value, recomputing when dirty.
    fn resolve(this: &Arc<Self>) -> T {
        let stale_deps = {
            let mut state = this.state.lock();
            if !state.dirty {
                if let Some(value) = state.value.clone() {
                    return value;
                }
            }
            std::mem::take(&mut state.dependencies)
        };
        detach_from(stale_deps, this.sub_id);

        // Track this cell while its function runs. The state lock is
        // released; reads inside the function re-enter it briefly
        // through add_dependency.
        let me: Arc<dyn Subscriber> = this.clone();
        let prev = swap_active(Some(me));
        let value = (&mut **this.func.lock())();
        swap_active(prev);

        let mut state = this.state.lock();
        state.value = Some(value.clone());
        state.dirty = false;
        value
    }
}

impl<T: Send + 'static> Dependency for DerivedInner<T> {
    fn dep_id(&self) -> DependencyId {
        self.dep_id
    }

    fn subscribe(&self, sub: Arc<dyn Subscriber>) {
        self.state.lock().subscribers.insert(sub.sub_id(), sub);
    }

    fn unsubscribe(&self, id: SubscriberId) {
        self.state.lock().subscribers.remove(&id);
    }
}

impl<T: Send + 'static> Subscriber for DerivedInner<T> {
    fn sub_id(&self) -> SubscriberId {
        self.sub_id
    }

    /// A dependency changed: mark dirty and propagate to our subscribers.
    /// Already-dirty cells stop the wave here.
    fn on_dependency_updated(&self) {
        let subs = {
            let mut state = self.state.lock();
            if state.dirty {
                return;
            }
            state.dirty = true;
            state.subscribers.values().cloned().collect::<Vec<_>>()
        };
        for sub in subs {
            sub.on_dependency_updated();
        }
    }

    fn add_dependency(&self, id: DependencyId, dep: std::sync::Weak<dyn Dependency>) {
        self.state.lock().dependencies.insert(id, dep);
    }
}

impl<T> Gettable for DerivedCell<T>
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{cell, create_effect};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn derived_tracks_source() {
        let a = cell(1);
        let ac = a.clone();
        let double = derived(move || ac.get() * 2);
        assert_eq!(double.get(), 2);
        a.set(2);
        assert_eq!(double.get(), 4);
    }

    #[test]
    fn lazy_until_first_get() {
        let a = cell(1);
        let evals = Arc::new(AtomicUsize::new(0));
        let evals_c = evals.clone();
        let ac = a.clone();
        let d = derived(move || {
            evals_c.fetch_add(1, Ordering::SeqCst);
            ac.get() * 2
        });

        assert_eq!(evals.load(Ordering::SeqCst), 0);
        assert_eq!(d.get(), 2);
        assert_eq!(d.get(), 2);
        assert_eq!(evals.load(Ordering::SeqCst), 1);

        // A write dirties the cell but does not recompute.
        a.set(5);
        assert_eq!(evals.load(Ordering::SeqCst), 1);
        assert_eq!(d.get(), 10);
        assert_eq!(evals.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn no_recompute_without_change() {
        let a = cell(3);
        let evals = Arc::new(AtomicUsize::new(0));
        let evals_c = evals.clone();
        let ac = a.clone();
        let d = derived(move || {
            evals_c.fetch_add(1, Ordering::SeqCst);
            ac.get()
        });
        let _ = d.get();
        let _ = d.get();
        let _ = d.get();
        assert_eq!(evals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn derived_chain() {
        let a = cell(1);
        let ac = a.clone();
        let double = derived(move || ac.get() * 2);
        let dc = double.clone();
        let quad = derived(move || dc.get() * 2);
        assert_eq!(quad.get(), 4);
        a.set(3);
        assert_eq!(double.get(), 6);
        assert_eq!(quad.get(), 12);
    }

    #[test]
    fn effect_depending_on_derived_reruns() {
        let a = cell(1);
        let ac = a.clone();
        let double = derived(move || ac.get() * 2);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_c = seen.clone();
        let dc = double.clone();
        let _effect = create_effect(move || {
            seen_c.lock().push(dc.get());
        });

        assert_eq!(*seen.lock(), vec![2]);
        a.set(4);
        assert_eq!(*seen.lock(), vec![2, 8]);
    }

    #[test]
    fn dirty_propagates_once() {
        // Two writes with no read in between must not wake the effect's
        // dependency chain twice through an already-dirty derived cell...
        // except the effect re-reads (and so re-cleans) it each run.
        let a = cell(1);
        let ac = a.clone();
        let d = derived(move || ac.get());

        let runs = Arc::new(AtomicUsize::new(0));
        let runs_c = runs.clone();
        let dc = d.clone();
        let _effect = create_effect(move || {
            let _ = dc.get();
            runs_c.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        a.set(2);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        a.set(3);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn peek_does_not_subscribe() {
        let a = cell(1);
        let ac = a.clone();
        let d = derived(move || ac.get());

        let runs = Arc::new(AtomicUsize::new(0));
        let runs_c = runs.clone();
        let dc = d.clone();
        let _effect = create_effect(move || {
            let _ = dc.peek();
            runs_c.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        a.set(2);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
