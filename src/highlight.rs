//! Pluggable code-block highlighting.
//!
//! The renderer asks [`highlight`] for styled spans when it draws a fenced
//! code block. The default backend paints the whole block dim; an
//! application can install a real syntax highlighter with
//! [`set_highlighter`].

use parking_lot::RwLock;

use crate::markup::Style;

// ---------------------------------------------------------------------------
// Span
// ---------------------------------------------------------------------------

/// A run of code with one style. Spans may contain newlines; the renderer
/// advances rows as it draws them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

impl Span {
    pub fn new(text: impl Into<String>, style: Style) -> Span {
        Span {
            text: text.into(),
            style,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// A highlighting backend: code and language tag in, styled spans out.
pub type Highlighter = fn(code: &str, lang: &str) -> Vec<Span>;

static HIGHLIGHTER: RwLock<Option<Highlighter>> = RwLock::new(None);

/// Install a highlighting backend for fenced code blocks.
pub fn set_highlighter(highlighter: Highlighter) {
    *HIGHLIGHTER.write() = Some(highlighter);
}

/// Highlight `code` with the installed backend, or fall back to a single
/// dim span.
pub fn highlight(code: &str, lang: &str) -> Vec<Span> {
    if let Some(highlighter) = *HIGHLIGHTER.read() {
        return highlighter(code, lang);
    }
    vec![Span::new(code, Style::dim())]
}

// ===========================================================================
// Tests
// ===========================================================================
