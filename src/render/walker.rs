//! The reactive render pass: walking a template tree into the back buffer.
//!
//! [`render`] mounts a view function inside an effect. Each run calls the
//! function for a fresh [`Renderable`], then walks its tree inside
//! [`Screen::frame`] — so the whole walk plus the diff/flush is one atomic
//! frame, and every cell read during the walk subscribes the effect. When a
//! conditional view stops reading a cell, the effect's next run drops that
//! subscription automatically.

use crate::buffer::Buffer;
use crate::highlight::highlight;
use crate::markup::{self, Node, NodeKind, Style};
use crate::reactive::{create_effect, Effect, Value};
use crate::screen::Screen;

use super::template::{Arg, Renderable};

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

/// Mount a reactive view on the screen.
///
/// Runs `view` once immediately and again whenever any cell it read
/// changes. The returned [`Effect`] can be kept to [`Effect::dispose`] the
/// view; dropping it leaves the view mounted.
pub fn render(screen: &Screen, mut view: impl FnMut() -> Renderable + Send + 'static) -> Effect {
    let screen = screen.clone();
    create_effect(move || {
        let renderable = view();
        let scroll_y = screen.scroll_y();
        screen.frame(|back| {
            render_node(back, &renderable.root, &renderable.args, 0, -scroll_y, Style::new());
        });
    })
}

// ---------------------------------------------------------------------------
// Tree walk
// ---------------------------------------------------------------------------

/// Draw `node` at `(x, y)` with the style inherited from its ancestors.
/// Returns the position for the next sibling: inline nodes advance x,
/// block nodes advance y.
pub(crate) fn render_node(
    back: &mut Buffer,
    node: &Node,
    args: &[Arg],
    x: i32,
    y: i32,
    inherited: Style,
) -> (i32, i32) {
    // Below the viewport nothing is drawn, but siblings still need a
    // plausible position.
    if y >= back.height() {
        return (x, y);
    }

    let style = inherited.merge_over(node.own_style());

    match &node.kind {
        NodeKind::Root | NodeKind::List => {
            let mut cur_y = y;
            for child in &node.children {
                let (_, new_y) = render_node(back, child, args, x, cur_y, style);
                cur_y = new_y;
            }
            (x, cur_y)
        }

        NodeKind::Block | NodeKind::Header(_) => {
            let mut cur_x = x;
            for child in &node.children {
                let (new_x, _) = render_node(back, child, args, cur_x, y, style);
                cur_x = new_x;
            }
            (x, y + 1)
        }

        NodeKind::Rule => {
            if y >= 0 {
                for i in 0..back.width() {
                    back.set(i, y, '─', Style::dim());
                }
            }
            (x, y + 1)
        }

        NodeKind::Quote => {
            if y >= 0 {
                back.set(x, y, '│', Style::dim());
            }
            let mut cur_x = x + 2;
            for child in &node.children {
                let (new_x, _) = render_node(back, child, args, cur_x, y, style);
                cur_x = new_x;
            }
            (x, y + 1)
        }

        NodeKind::ListItem => {
            if y >= 0 {
                back.set(x, y, '•', Style::new());
            }
            let mut cur_x = x + 2;
            for child in &node.children {
                let (new_x, _) = render_node(back, child, args, cur_x, y, style);
                cur_x = new_x;
            }
            (x, y + 1)
        }

        NodeKind::CodeBlock { lang, body } => {
            let spans = highlight(body, lang);
            let mut cur_x = x;
            let mut cur_y = y;
            for span in &spans {
                for (i, part) in span.text.split('\n').enumerate() {
                    if i > 0 {
                        cur_y += 1;
                        cur_x = x;
                    }
                    if part.is_empty() {
                        continue;
                    }
                    if cur_y >= 0 && cur_y < back.height() {
                        back.draw_text(cur_x, cur_y, part, span.style);
                    }
                    cur_x += part.chars().count() as i32;
                }
            }
            (x, cur_y + 1)
        }

        NodeKind::Text(content) => {
            if content.is_empty() {
                // A blank line: pure vertical space.
                return (x, y + 1);
            }
            if y >= 0 {
                back.draw_text(x, y, content, style);
            }
            (x + content.chars().count() as i32, y)
        }

        NodeKind::Style(_) => {
            let mut cur_x = x;
            for child in &node.children {
                let (new_x, _) = render_node(back, child, args, cur_x, y, style);
                cur_x = new_x;
            }
            (cur_x, y)
        }

        NodeKind::Hole(index) => {
            let Some(arg) = args.get(*index) else {
                // Missing argument: the hole renders empty.
                return (x, y);
            };
            match arg.resolve() {
                Value::Layout(layout) => {
                    let constraint_w = back.width() - x;
                    let constraint_h = back.height() - y;
                    let (_, h) = layout.measure(constraint_w, constraint_h);
                    layout.draw(back, x, y);
                    (x, y + h)
                }
                Value::Text(text) => {
                    if contains_markup(&text) {
                        render_markup_fragment(back, &text, x, y, style)
                    } else {
                        if y >= 0 {
                            back.draw_text(x, y, &text, style);
                        }
                        (x + text.chars().count() as i32, y)
                    }
                }
            }
        }
    }
}

/// Re-parse a hole's string as markup and render its inline content,
/// inheriting the hole's style. Only paragraph content participates; any
/// nested holes stay unresolved.
fn render_markup_fragment(back: &mut Buffer, text: &str, x: i32, y: i32, style: Style) -> (i32, i32) {
    let fragment = markup::parse(text);
    let mut cur_x = x;
    for child in &fragment.children {
        if child.kind != NodeKind::Block {
            continue;
        }
        for inline in &child.children {
            let (new_x, _) = render_node(back, inline, &[], cur_x, y, style);
            cur_x = new_x;
        }
    }
    (cur_x, y)
}

/// Cheap sigil scan deciding whether a hole's string is re-parsed as
/// markup. User data containing these characters is reinterpreted.
fn contains_markup(text: &str) -> bool {
    ["**", "__", "#", "!"].iter().any(|sigil| text.contains(sigil))
}

// ===========================================================================
// Tests
// ===========================================================================
