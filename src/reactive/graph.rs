//! Capability traits and ambient graph state.
//!
//! The graph is held together by two erased capability traits: [`Dependency`]
//! (something that can be depended on — a state or derived cell) and
//! [`Subscriber`] (something that depends on others — an effect or derived
//! cell). Links are symmetric: every (dependency → subscriber) entry has a
//! matching (subscriber → dependency) entry, so teardown never traces the
//! graph. The dependency side holds strong references to its subscribers;
//! the subscriber side holds weak back-edges.
//!
//! Two pieces of ambient state live here: the active-subscriber slot (the
//! "currently tracking" subscriber that `get` calls register against) and
//! the batch state (depth counter plus a queue of subscribers flushed when
//! the outermost batch exits). Both are dynamically-scoped per thread —
//! tracking follows the thread a subscriber runs on, and a batch groups the
//! writes made on the thread that opened it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::layout::Layout;

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// Identity of a dependency (state cell or derived cell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyId(u64);

/// Identity of a subscriber (effect or derived cell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_dependency_id() -> DependencyId {
    DependencyId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

pub(crate) fn next_subscriber_id() -> SubscriberId {
    SubscriberId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// A value resolved from a template hole or a layout leaf.
#[derive(Clone)]
pub enum Value {
    /// Plain text. Drawn as-is, or re-parsed as an inline fragment when it
    /// contains markup sigils.
    Text(String),
    /// A layout subtree, measured and drawn in place.
    Layout(Layout),
}

/// Type-erased read access for reactive primitives placed in templates or
/// layout leaves.
///
/// Reading through `get_value` goes through the cell's tracked `get`, so the
/// running subscriber (typically the render effect) is registered as a
/// dependent.
pub trait Gettable: Send + Sync {
    fn get_value(&self) -> Value;
}

/// Conversion into a [`Value`] for types that can sit in a template hole.
///
/// One impl per type instead of runtime reflection: primitives format
/// through `Display`, layout trees pass through untouched.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

macro_rules! impl_to_value_via_display {
    ($($ty:ty),* $(,)?) => {
        $(impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::Text(self.to_string())
            }
        })*
    };
}

impl_to_value_via_display!(
    String, &str, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
    f32, f64,
);

impl ToValue for Layout {
    fn to_value(&self) -> Value {
        Value::Layout(self.clone())
    }
}

/// Something that can be depended on: a state cell or a derived cell.
pub trait Dependency: Send + Sync {
    /// Stable identity for symmetric link bookkeeping.
    fn dep_id(&self) -> DependencyId;
    /// Record `sub` as a subscriber of this dependency.
    fn subscribe(&self, sub: Arc<dyn Subscriber>);
    /// Remove the subscriber with the given identity.
    fn unsubscribe(&self, id: SubscriberId);
}

/// Something that depends on others: an effect or a derived cell.
pub trait Subscriber: Send + Sync {
    /// Stable identity for symmetric link bookkeeping.
    fn sub_id(&self) -> SubscriberId;
    /// A dependency changed (or became dirty).
    fn on_dependency_updated(&self);
    /// Record a back-edge to a dependency read during the current run.
    fn add_dependency(&self, id: DependencyId, dep: Weak<dyn Dependency>);
}

/// A subscriber's set of weak back-edges to its dependencies.
pub(crate) type DependencySet = HashMap<DependencyId, Weak<dyn Dependency>>;

/// Unsubscribe `id` from every still-alive dependency in `deps`.
pub(crate) fn detach_from(deps: DependencySet, id: SubscriberId) {
    for (_, dep) in deps {
        if let Some(dep) = dep.upgrade() {
            dep.unsubscribe(id);
        }
    }
}

// ---------------------------------------------------------------------------
// Active-subscriber slot
// ---------------------------------------------------------------------------

thread_local! {
    static ACTIVE_SUBSCRIBER: RefCell<Option<Arc<dyn Subscriber>>> = const { RefCell::new(None) };
}

/// The subscriber currently tracking reads on this thread, if any.
pub(crate) fn current_subscriber() -> Option<Arc<dyn Subscriber>> {
    ACTIVE_SUBSCRIBER.with(|slot| slot.borrow().clone())
}

/// Install `sub` as the tracking subscriber, returning the previous occupant.
///
/// Callers restore the previous occupant when their run finishes
/// (save-on-enter, restore-on-exit), which makes tracking re-entrant.
pub(crate) fn swap_active(sub: Option<Arc<dyn Subscriber>>) -> Option<Arc<dyn Subscriber>> {
    ACTIVE_SUBSCRIBER.with(|slot| std::mem::replace(&mut *slot.borrow_mut(), sub))
}

/// Register the currently tracking subscriber (if any) against `dep`,
/// creating both halves of the symmetric link.
pub(crate) fn track_read(dep: &Arc<impl Dependency + 'static>) {
    if let Some(active) = current_subscriber() {
        let dep_dyn: Arc<dyn Dependency> = dep.clone();
        let weak: Weak<dyn Dependency> = Arc::downgrade(&dep_dyn);
        active.add_dependency(dep.dep_id(), weak);
        dep.subscribe(active);
    }
}

// ---------------------------------------------------------------------------
// Batch state
// ---------------------------------------------------------------------------

#[derive(Default)]
struct BatchState {
    depth: usize,
    /// Subscribers to flush on outermost exit, deduplicated by identity,
    /// in insertion order.
    queue: Vec<Arc<dyn Subscriber>>,
}

thread_local! {
    static BATCH: RefCell<BatchState> = RefCell::new(BatchState::default());
}

/// Group writes so each affected effect runs at most once.
///
/// Increments the batch depth, runs `f`, then decrements; when the depth
/// returns to zero the queued subscribers are flushed once, in the order
/// they were first enqueued. Nested batches flush only on the outermost
/// exit. A batch groups the writes made on its own thread; independent
/// writers on other threads propagate immediately.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    BATCH.with(|b| b.borrow_mut().depth += 1);

    let result = f();

    let pending = BATCH.with(|b| {
        let mut b = b.borrow_mut();
        b.depth -= 1;
        if b.depth == 0 {
            std::mem::take(&mut b.queue)
        } else {
            Vec::new()
        }
    });

    for sub in pending {
        sub.on_dependency_updated();
    }

    result
}

/// If a batch is active on this thread, enqueue `sub` for the flush and
/// return true. Duplicate identities are enqueued once.
pub(crate) fn enqueue_if_batching(sub: &Arc<dyn Subscriber>) -> bool {
    BATCH.with(|b| {
        let mut b = b.borrow_mut();
        if b.depth == 0 {
            return false;
        }
        let id = sub.sub_id();
        if !b.queue.iter().any(|queued| queued.sub_id() == id) {
            b.queue.push(sub.clone());
        }
        true
    })
}

// ===========================================================================
// Tests
// ===========================================================================
