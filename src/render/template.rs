//! Templates: parsed markup plus bound hole arguments.
//!
//! [`template`] parses a markup string once and stores the arguments its
//! `%v` holes resolve to. Arguments can be plain values (formatted up
//! front), reactive cells (read on every render pass, subscribing the
//! render effect), or layout trees. The [`template!`] macro applies
//! [`IntoArg`] to each argument.
//!
//! [`template!`]: crate::template!

use std::sync::Arc;

use crate::layout::{Layout, LayoutNode};
use crate::markup::{self, Node};
use crate::reactive::{DerivedCell, Gettable, StateCell, ToValue, Value};

// ---------------------------------------------------------------------------
// Arg
// ---------------------------------------------------------------------------

/// One bound template argument.
pub enum Arg {
    /// A value fixed at template construction.
    Value(Value),
    /// A reactive cell, re-read (and re-subscribed) on every render pass.
    Cell(Arc<dyn Gettable>),
}

impl Arg {
    /// The current value of this argument. Reading a cell argument
    /// registers the running subscriber.
    pub(crate) fn resolve(&self) -> Value {
        match self {
            Arg::Value(value) => value.clone(),
            Arg::Cell(cell) => cell.get_value(),
        }
    }
}

/// Conversion into a template argument.
pub trait IntoArg {
    fn into_arg(self) -> Arg;
}

impl IntoArg for Arg {
    fn into_arg(self) -> Arg {
        self
    }
}

macro_rules! impl_into_arg_via_display {
    ($($ty:ty),* $(,)?) => {
        $(impl IntoArg for $ty {
            fn into_arg(self) -> Arg {
                Arg::Value(Value::Text(self.to_string()))
            }
        })*
    };
}

impl_into_arg_via_display!(
    String, &str, bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64,
);

impl IntoArg for LayoutNode {
    fn into_arg(self) -> Arg {
        Arg::Value(Value::Layout(Arc::new(self)))
    }
}

impl IntoArg for Layout {
    fn into_arg(self) -> Arg {
        Arg::Value(Value::Layout(self))
    }
}

impl<T> IntoArg for StateCell<T>
where
    T: ToValue + Clone + Send + Sync + 'static,
{
    fn into_arg(self) -> Arg {
        Arg::Cell(Arc::new(self))
    }
}

impl<T> IntoArg for DerivedCell<T>
where
    T: ToValue + Clone + Send + Sync + 'static,
{
    fn into_arg(self) -> Arg {
        Arg::Cell(Arc::new(self))
    }
}

// ---------------------------------------------------------------------------
// Renderable
// ---------------------------------------------------------------------------

/// A parsed template and its bound arguments, ready for the renderer.
pub struct Renderable {
    pub root: Node,
    pub args: Vec<Arg>,
}

/// Parse a markup template and bind hole arguments.
///
/// Any number of arguments is accepted: extras are ignored, and holes
/// without a matching argument render empty.
pub fn template(source: &str, args: Vec<Arg>) -> Renderable {
    Renderable {
        root: markup::parse(source),
        args,
    }
}

/// Variadic form of [`template`]: applies [`IntoArg`] to each argument.
///
/// ```ignore
/// let count = cell(0);
/// let view = template!("Count: **%v**", count.clone());
/// ```
#[macro_export]
macro_rules! template {
    ($source:expr $(, $arg:expr)* $(,)?) => {
        $crate::render::template($source, vec![$($crate::render::IntoArg::into_arg($arg)),*])
    };
}

// ===========================================================================
// Tests
// ===========================================================================
