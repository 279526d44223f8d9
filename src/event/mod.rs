//! Input events and the byte-level key decoder.

pub(crate) mod decoder;
mod input;

pub use input::{Key, KeyEvent, Modifiers};
