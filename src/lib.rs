//! # weft-tui
//!
//! A reactive terminal UI library: describe the screen as a markup template
//! bound to reactive state cells, and the terminal is updated with the
//! minimum number of character writes whenever a cell changes.
//!
//! Three subsystems compose:
//!
//! - a [reactive graph](crate::reactive) — state cells, derived cells, and
//!   effects with automatic dependency tracking and batched propagation;
//! - a [double-buffered screen](crate::screen) — a cell grid diffed
//!   style-aware against what is on the terminal, raw-mode lifecycle,
//!   resize handling, and a byte-level input decoder;
//! - a [template](crate::render) + [layout](crate::layout) engine — a small
//!   markdown dialect with `%v` holes, and flexbox-like rows/columns.
//!
//! Rendering runs inside an effect: cells read during the walk subscribe
//! the renderer to exactly the state it displayed, so a write to any of
//! them coalesces into one atomic frame.
//!
//! ```ignore
//! use weft_tui::{cell, render, template, Screen};
//!
//! let screen = Screen::new()?;
//! let count = cell(0);
//!
//! let view = count.clone();
//! render(&screen, move || template!("Count: **%v**", view.clone()));
//!
//! screen.on_key({
//!     let count = count.clone();
//!     move |_| count.update(|n| *n += 1)
//! });
//! ```
//!
//! The graph is multi-thread friendly — producer threads may write cells
//! while the render effect runs — but it is designed around one logical UI
//! thread; driving several independent reactive graphs concurrently in one
//! process is out of scope.

pub mod buffer;
pub mod error;
pub mod event;
pub mod highlight;
pub mod layout;
pub mod markup;
pub mod reactive;
pub mod render;
pub mod screen;
pub mod testing;

pub use buffer::{Buffer, Cell};
pub use error::Error;
pub use event::{Key, KeyEvent, Modifiers};
pub use highlight::{highlight, set_highlighter, Span};
pub use layout::{auto, boxed, col, fixed, flex, row, Layout, LayoutNode, Sizing};
pub use markup::{Color, Style};
pub use reactive::{batch, cell, create_effect, derived, opaque_cell, DerivedCell, Effect, StateCell};
pub use render::{render, template, Renderable};
pub use screen::{Capabilities, Screen};
