//! Templates and the reactive render pass.

mod template;
mod walker;

pub use template::{template, Arg, IntoArg, Renderable};
pub use walker::render;
