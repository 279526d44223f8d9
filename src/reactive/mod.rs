//! Fine-grained reactive primitives: state cells, derived cells, effects.
//!
//! Reads inside an effect (or a derived cell's computation) are tracked
//! automatically; each run replaces the subscriber's dependency set with
//! exactly the cells it read. Cells are `Arc`-shared and individually
//! locked, so producer threads can write them while the render effect reads.

mod derived;
mod effect;
mod graph;
mod signal;

pub use derived::{derived, DerivedCell};
pub use effect::{create_effect, Effect};
pub use graph::{batch, Dependency, DependencyId, Gettable, Subscriber, SubscriberId, ToValue, Value};
pub use signal::{cell, opaque_cell, StateCell};
