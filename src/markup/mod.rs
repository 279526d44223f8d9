//! The markup dialect: a small markdown variant with `%v` template holes.
//!
//! Headers, lists, quotes, fenced code blocks, and horizontal rules at the
//! block level; bold/italic/underline/strike, named fg/bg colors, and holes
//! inline. See [`parse`] for the grammar entry point.

mod ast;
mod parser;
mod style;

pub use ast::{Node, NodeKind};
pub use parser::parse;
pub use style::{Color, Style};
