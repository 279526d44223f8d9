//! Buffer-to-text snapshots.

use crate::buffer::Buffer;

/// Render a buffer as plain text: one line per row, blank cells as spaces,
/// trailing spaces trimmed, rows joined with `'\n'`.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let mut lines = Vec::with_capacity(buffer.height().max(0) as usize);
    for y in 0..buffer.height() {
        let line: String = (0..buffer.width())
            .map(|x| {
                let ch = buffer.get(x, y).ch;
                if ch == '\0' {
                    ' '
                } else {
                    ch
                }
            })
            .collect();
        lines.push(line.trim_end().to_owned());
    }
    lines.join("\n")
}

// ===========================================================================
// Tests
// ===========================================================================
