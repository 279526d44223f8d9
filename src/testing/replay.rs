//! Re-apply an emitted ANSI stream to a buffer.
//!
//! [`apply_ansi`] interprets exactly the wire format the screen emits —
//! CSI cursor positioning, the 16-color SGR set, and cursor visibility —
//! and plays it onto a buffer. Replaying a frame's output over a copy of
//! the previous front buffer must reproduce the back buffer; that is the
//! diff-correctness invariant the property tests check.

use crate::buffer::Buffer;
use crate::markup::{Color, Style};

/// Interpret `bytes` (UTF-8 ANSI output) onto `buffer`.
pub fn apply_ansi(buffer: &mut Buffer, bytes: &[u8]) {
    let text = String::from_utf8_lossy(bytes);
    let mut chars = text.chars().peekable();

    let mut x = 0;
    let mut y = 0;
    let mut style = Style::new();

    while let Some(ch) = chars.next() {
        if ch != '\u{1b}' {
            buffer.set(x, y, ch, style);
            x += 1;
            continue;
        }

        // CSI: ESC [ params final
        if chars.peek() != Some(&'[') {
            continue;
        }
        chars.next();

        let mut params = String::new();
        let mut final_byte = '\0';
        for ch in chars.by_ref() {
            if ('\u{40}'..='\u{7e}').contains(&ch) {
                final_byte = ch;
                break;
            }
            params.push(ch);
        }

        match final_byte {
            'H' => {
                let mut parts = params.split(';');
                let row: i32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(1);
                let col: i32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(1);
                x = col - 1;
                y = row - 1;
            }
            'm' => {
                for code in params.split(';') {
                    apply_sgr(&mut style, code.parse().unwrap_or(0));
                }
            }
            // Cursor visibility and anything else: no cell effect.
            _ => {}
        }
    }
}

fn apply_sgr(style: &mut Style, code: u8) {
    match code {
        0 => *style = Style::new(),
        1 => style.bold = true,
        2 => style.dim = true,
        3 => style.italic = true,
        4 => style.underline = true,
        5 => style.blink = true,
        7 => style.reverse = true,
        9 => style.strike = true,
        30..=37 | 90 => style.fg = sgr_color(if code == 90 { 90 } else { code - 30 }),
        40..=47 | 100 => style.bg = sgr_color(if code == 100 { 90 } else { code - 40 }),
        _ => {}
    }
}

fn sgr_color(slot: u8) -> Option<Color> {
    match slot {
        0 => Some(Color::Black),
        1 => Some(Color::Red),
        2 => Some(Color::Green),
        3 => Some(Color::Yellow),
        4 => Some(Color::Blue),
        5 => Some(Color::Magenta),
        6 => Some(Color::Cyan),
        7 => Some(Color::White),
        90 => Some(Color::Grey),
        _ => None,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
