//! The measure and draw passes.
//!
//! Sizing is border-box: padding and border consume space from the
//! constraint a node receives, and the remainder is offered to children.
//! Measure runs in three phases — fixed children first, then auto children
//! at the full content constraint, then flex children splitting whatever is
//! left by integer weight (truncating division; the last cell falls out).
//! Draw places children sequentially along the main axis.

use crate::buffer::Buffer;
use crate::markup::Style;

use super::node::{Content, Direction, LayoutNode, Resolved, Sizing};

impl LayoutNode {
    /// Compute sizes for this subtree under `(constraint_w, constraint_h)`.
    ///
    /// Returns the node's own size: content size for `Auto` axes, the
    /// incoming constraint otherwise. Child geometry is cached on each node
    /// for the draw pass.
    pub fn measure(&self, constraint_w: i32, constraint_h: i32) -> (i32, i32) {
        let h_chrome = self.padding * 2 + if self.border { 2 } else { 0 };
        let v_chrome = h_chrome;
        let content_w = (constraint_w - h_chrome).max(0);
        let content_h = (constraint_h - v_chrome).max(0);
        let row = self.direction == Direction::Row;

        let resolved: Vec<Resolved> = self.children.iter().map(Content::resolve).collect();
        let mut sizes: Vec<(i32, i32)> = vec![(0, 0); resolved.len()];

        // Phase 1: fixed and auto children establish the claimed space.
        let mut total_fixed = 0;
        let mut total_auto = 0;
        let mut total_flex_weight = 0;

        for (i, child) in resolved.iter().enumerate() {
            match child {
                Resolved::Node(node) => {
                    let main_sizing = if row { node.width } else { node.height };
                    match main_sizing {
                        Sizing::Fixed(cells) => {
                            let size = if row {
                                node.measure(cells, content_h)
                            } else {
                                node.measure(content_w, cells)
                            };
                            sizes[i] = size;
                            total_fixed += main_axis(size, row);
                        }
                        Sizing::Auto => {
                            let size = node.measure(content_w, content_h);
                            sizes[i] = size;
                            total_auto += main_axis(size, row);
                        }
                        Sizing::Flex(weight) => total_flex_weight += weight,
                    }
                }
                Resolved::Text(text) => {
                    let size = measure_text(text, content_w, content_h);
                    sizes[i] = size;
                    total_auto += main_axis(size, row);
                }
            }
        }

        // Phase 2: flex children split the residual main-axis space by
        // weight. Integer division; no remainder redistribution.
        let content_main = if row { content_w } else { content_h };
        let available = (content_main - total_fixed - total_auto).max(0);

        let mut max_cross = 0;
        for (i, child) in resolved.iter().enumerate() {
            if let Resolved::Node(node) = child {
                let main_sizing = if row { node.width } else { node.height };
                if let Sizing::Flex(weight) = main_sizing {
                    let share = if total_flex_weight > 0 {
                        (available * weight) / total_flex_weight
                    } else {
                        0
                    };
                    sizes[i] = if row {
                        node.measure(share, content_h)
                    } else {
                        node.measure(content_w, share)
                    };
                }
            }
            max_cross = max_cross.max(cross_axis(sizes[i], row));
        }

        // Phase 3: auto axes bubble content size up; fixed/flex axes keep
        // the caller's constraint.
        let mut final_w = constraint_w;
        let mut final_h = constraint_h;

        if self.width == Sizing::Auto {
            final_w = if row {
                sizes.iter().map(|s| s.0).sum::<i32>()
            } else {
                max_cross
            } + h_chrome;
        }
        if self.height == Sizing::Auto {
            final_h = if row {
                max_cross
            } else {
                sizes.iter().map(|s| s.1).sum::<i32>()
            } + v_chrome;
        }

        let mut geom = self.geom.lock();
        geom.w = final_w;
        geom.h = final_h;
        geom.child_sizes = sizes;

        (final_w, final_h)
    }

    /// Draw this subtree at `(x, y)` using the geometry from the last
    /// measure pass.
    pub fn draw(&self, buffer: &mut Buffer, x: i32, y: i32) {
        let (w, h, child_sizes) = {
            let mut geom = self.geom.lock();
            geom.x = x;
            geom.y = y;
            (geom.w, geom.h, geom.child_sizes.clone())
        };

        if self.border {
            draw_border(buffer, x, y, w, h);
        }

        let inset = self.padding + if self.border { 1 } else { 0 };
        let mut cur_x = x + inset;
        let mut cur_y = y + inset;

        for (i, child) in self.children.iter().enumerate() {
            let size = child_sizes.get(i).copied().unwrap_or((0, 0));
            match child.resolve() {
                Resolved::Node(node) => node.draw(buffer, cur_x, cur_y),
                Resolved::Text(text) => draw_text_clipped(buffer, &text, cur_x, cur_y, size.0, size.1),
            }
            match self.direction {
                Direction::Row => cur_x += size.0,
                Direction::Column => cur_y += size.1,
            }
        }
    }
}

fn main_axis(size: (i32, i32), row: bool) -> i32 {
    if row {
        size.0
    } else {
        size.1
    }
}

fn cross_axis(size: (i32, i32), row: bool) -> i32 {
    if row {
        size.1
    } else {
        size.0
    }
}

/// Natural size of leaf text: widest line × line count, clamped to the
/// constraint. One column per code point.
fn measure_text(text: &str, max_w: i32, max_h: i32) -> (i32, i32) {
    let mut widest = 0;
    let mut lines = 0;
    for line in text.split('\n') {
        widest = widest.max(line.chars().count() as i32);
        lines += 1;
    }
    (widest.min(max_w), lines.min(max_h))
}

/// Draw leaf text, truncated to `w` columns and `h` rows.
fn draw_text_clipped(buffer: &mut Buffer, text: &str, x: i32, y: i32, w: i32, h: i32) {
    for (row, line) in text.split('\n').enumerate() {
        if row as i32 >= h {
            break;
        }
        let mut col = x;
        for ch in line.chars().take(w.max(0) as usize) {
            buffer.set(col, y + row as i32, ch, Style::new());
            col += 1;
        }
    }
}

/// Unicode box-drawing border around the node's computed box.
fn draw_border(buffer: &mut Buffer, x: i32, y: i32, w: i32, h: i32) {
    if w < 1 || h < 1 {
        return;
    }
    let style = Style::new();

    buffer.set(x, y, '┌', style);
    buffer.set(x + w - 1, y, '┐', style);
    buffer.set(x, y + h - 1, '└', style);
    buffer.set(x + w - 1, y + h - 1, '┘', style);

    for i in 1..w - 1 {
        buffer.set(x + i, y, '─', style);
        buffer.set(x + i, y + h - 1, '─', style);
    }
    for i in 1..h - 1 {
        buffer.set(x, y + i, '│', style);
        buffer.set(x + w - 1, y + i, '│', style);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
