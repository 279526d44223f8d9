//! Effects: side-effectful functions re-run when tracked cells change.
//!
//! [`create_effect`] runs the function once synchronously, recording every
//! cell it reads. Each subsequent run replaces the dependency set wholesale,
//! so a conditional branch that stops reading a cell also stops the effect
//! from waking on that cell's writes.
//!
//! An effect notified while it is already running is flagged and re-run once
//! the current run finishes; an effect notified during a batch is queued and
//! runs once when the outermost batch exits.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::graph::{
    detach_from, enqueue_if_batching, next_subscriber_id, swap_active, Dependency, DependencyId,
    DependencySet, Subscriber, SubscriberId,
};

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Create an effect and run it once immediately.
///
/// The returned handle is only needed for [`Effect::dispose`]; dropping it
/// does not detach the effect — the cells it reads keep it alive and keep
/// re-running it.
pub fn create_effect(f: impl FnMut() + Send + 'static) -> Effect {
    let inner = Arc::new_cyclic(|weak: &Weak<EffectInner>| EffectInner {
        sub_id: next_subscriber_id(),
        self_weak: weak.clone(),
        func: Mutex::new(Box::new(f)),
        state: Mutex::new(EffectState {
            dependencies: HashMap::new(),
            disposed: false,
            running: false,
            pending: false,
        }),
    });
    inner.run();
    Effect { inner }
}

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

struct EffectState {
    dependencies: DependencySet,
    disposed: bool,
    /// The function is currently executing on some thread.
    running: bool,
    /// A notification arrived mid-run; run again when the current run ends.
    pending: bool,
}

pub(crate) struct EffectInner {
    sub_id: SubscriberId,
    self_weak: Weak<EffectInner>,
    func: Mutex<Box<dyn FnMut() + Send>>,
    state: Mutex<EffectState>,
}

/// Handle to a running effect. See [`create_effect`].
pub struct Effect {
    inner: Arc<EffectInner>,
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.sub_id)
            .finish()
    }
}

impl Effect {
    /// Detach the effect from every cell it depends on.
    ///
    /// All future dependency notifications become no-ops; the function never
    /// runs again.
    pub fn dispose(&self) {
        let deps = {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            std::mem::take(&mut state.dependencies)
        };
        detach_from(deps, self.inner.sub_id);
    }
}

impl EffectInner {
    /// Run the function: drop old dependency edges, track reads, and repeat
    /// while notifications arrived mid-run.
    fn run(&self) {
        loop {
            let old_deps = {
                let mut state = self.state.lock();
                if state.disposed {
                    return;
                }
                if state.running {
                    state.pending = true;
                    return;
                }
                state.running = true;
                state.pending = false;
                std::mem::take(&mut state.dependencies)
            };
            detach_from(old_deps, self.sub_id);

            let Some(me) = self.self_weak.upgrade() else {
                return;
            };
            let prev = swap_active(Some(me as Arc<dyn Subscriber>));
            (&mut **self.func.lock())();
            swap_active(prev);

            let mut state = self.state.lock();
            state.running = false;
            if !state.pending {
                return;
            }
        }
    }
}

impl Subscriber for EffectInner {
    fn sub_id(&self) -> SubscriberId {
        self.sub_id
    }

    fn on_dependency_updated(&self) {
        {
            let state = self.state.lock();
            if state.disposed {
                return;
            }
        }
        let Some(me) = self.self_weak.upgrade() else {
            return;
        };
        if enqueue_if_batching(&(me as Arc<dyn Subscriber>)) {
            return;
        }
        self.run();
    }

    fn add_dependency(&self, id: DependencyId, dep: Weak<dyn Dependency>) {
        let mut state = self.state.lock();
        if !state.disposed {
            state.dependencies.insert(id, dep);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
