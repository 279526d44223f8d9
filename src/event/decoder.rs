//! Byte-level key decoding.
//!
//! The pump splits input handling in two: a reader thread moves raw bytes
//! from the terminal into a bounded channel, and the decoder (this module)
//! interprets them with timeouts — a lone `ESC` is only a key press if no
//! follow-up byte arrives within [`ESC_TIMEOUT`]; bytes inside a CSI/SS3
//! sequence must arrive within [`SEQ_TIMEOUT`] of each other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use super::input::{Key, KeyEvent, Modifiers};

/// How long a bare `ESC` waits for a follow-up byte before it is reported
/// as the Esc key.
pub const ESC_TIMEOUT: Duration = Duration::from_millis(10);

/// Max wait between bytes inside an escape sequence.
pub const SEQ_TIMEOUT: Duration = Duration::from_millis(50);

/// Poll interval for the done flag while idle.
const IDLE_POLL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Decoder loop
// ---------------------------------------------------------------------------

/// Decode bytes from `rx` into key events until `done` is set or the sender
/// side disconnects (reader hit EOF).
pub(crate) fn run(rx: &Receiver<u8>, done: &AtomicBool, emit: &mut dyn FnMut(KeyEvent)) {
    loop {
        if done.load(Ordering::Acquire) {
            return;
        }
        match rx.recv_timeout(IDLE_POLL) {
            Ok(0x1b) => decode_escape(rx, emit),
            Ok(byte) => decode_plain(byte, emit),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// Handle an `ESC` byte: bare Esc, CSI, SS3, or Alt+key.
fn decode_escape(rx: &Receiver<u8>, emit: &mut dyn FnMut(KeyEvent)) {
    match rx.recv_timeout(ESC_TIMEOUT) {
        Ok(b'[') => decode_csi(rx, emit),
        Ok(b'O') => decode_ss3(rx, emit),
        Ok(byte) => emit(KeyEvent::new(Key::Char(byte as char), Modifiers::ALT)),
        Err(_) => emit(KeyEvent::plain(Key::Esc)),
    }
}

/// Handle a regular (non-ESC) byte.
fn decode_plain(byte: u8, emit: &mut dyn FnMut(KeyEvent)) {
    if byte <= 0x1f {
        match byte {
            0x0d => emit(KeyEvent::plain(Key::Enter)),
            0x09 => emit(KeyEvent::plain(Key::Tab)),
            0x08 => emit(KeyEvent::plain(Key::Backspace)),
            0x03 => emit(KeyEvent::new(Key::Char('c'), Modifiers::CTRL)),
            _ => emit(KeyEvent::new(
                Key::Char((byte + 0x60) as char),
                Modifiers::CTRL,
            )),
        }
    } else if byte == 0x7f {
        emit(KeyEvent::plain(Key::Backspace));
    } else {
        emit(KeyEvent::plain(Key::Char(byte as char)));
    }
}

// ---------------------------------------------------------------------------
// CSI
// ---------------------------------------------------------------------------

/// We consumed `ESC [`. Accumulate parameter bytes until a final byte in
/// `0x40..=0x7E`, then dispatch. A stalled sequence is dropped.
fn decode_csi(rx: &Receiver<u8>, emit: &mut dyn FnMut(KeyEvent)) {
    let mut params = Vec::new();
    loop {
        let byte = match rx.recv_timeout(SEQ_TIMEOUT) {
            Ok(byte) => byte,
            Err(_) => return,
        };
        if (0x40..=0x7e).contains(&byte) {
            dispatch_csi(&params, byte, emit);
            return;
        }
        params.push(byte);
    }
}

fn dispatch_csi(params: &[u8], final_byte: u8, emit: &mut dyn FnMut(KeyEvent)) {
    match final_byte {
        b'A' => emit(KeyEvent::plain(Key::Up)),
        b'B' => emit(KeyEvent::plain(Key::Down)),
        b'C' => emit(KeyEvent::plain(Key::Right)),
        b'D' => emit(KeyEvent::plain(Key::Left)),
        b'H' => emit(KeyEvent::plain(Key::Home)),
        b'F' => emit(KeyEvent::plain(Key::End)),
        b'~' => {
            // The leading parameter encodes the key; a modifier half after
            // a semicolon (e.g. "3;5") is ignored.
            let params = std::str::from_utf8(params).unwrap_or("");
            let key_code = params.split(';').next().unwrap_or("");
            let key = match key_code {
                "1" => Some(Key::Home),
                "2" => Some(Key::Insert),
                "3" => Some(Key::Delete),
                "4" => Some(Key::End),
                "5" => Some(Key::PageUp),
                "6" => Some(Key::PageDown),
                "15" => Some(Key::F(5)),
                "17" => Some(Key::F(6)),
                "18" => Some(Key::F(7)),
                "19" => Some(Key::F(8)),
                "20" => Some(Key::F(9)),
                "21" => Some(Key::F(10)),
                "23" => Some(Key::F(11)),
                "24" => Some(Key::F(12)),
                _ => None,
            };
            if let Some(key) = key {
                emit(KeyEvent::plain(key));
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// SS3
// ---------------------------------------------------------------------------

/// We consumed `ESC O`: F1..F4, application-mode arrows, keypad Home/End.
fn decode_ss3(rx: &Receiver<u8>, emit: &mut dyn FnMut(KeyEvent)) {
    let byte = match rx.recv_timeout(SEQ_TIMEOUT) {
        Ok(byte) => byte,
        Err(_) => return,
    };
    let key = match byte {
        b'A' => Some(Key::Up),
        b'B' => Some(Key::Down),
        b'C' => Some(Key::Right),
        b'D' => Some(Key::Left),
        b'P' => Some(Key::F(1)),
        b'Q' => Some(Key::F(2)),
        b'R' => Some(Key::F(3)),
        b'S' => Some(Key::F(4)),
        b'H' => Some(Key::Home),
        b'F' => Some(Key::End),
        _ => None,
    };
    if let Some(key) = key {
        emit(KeyEvent::plain(key));
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::sync_channel;

    /// Feed `bytes` to a decoder loop and collect what it emits. The sender
    /// is dropped after feeding, which terminates the loop.
    fn decode_all(bytes: &[u8]) -> Vec<KeyEvent> {
        let (tx, rx) = sync_channel(128);
        for &b in bytes {
            tx.send(b).expect("feed byte");
        }
        drop(tx);

        let done = AtomicBool::new(false);
        let mut events = Vec::new();
        run(&rx, &done, &mut |ev| events.push(ev));
        events
    }

    // ── Plain bytes ──────────────────────────────────────────────────

    #[test]
    fn printable_chars() {
        assert_eq!(
            decode_all(b"hi"),
            vec![
                KeyEvent::plain(Key::Char('h')),
                KeyEvent::plain(Key::Char('i')),
            ]
        );
    }

    #[test]
    fn control_bytes() {
        assert_eq!(decode_all(&[0x0d]), vec![KeyEvent::plain(Key::Enter)]);
        assert_eq!(decode_all(&[0x09]), vec![KeyEvent::plain(Key::Tab)]);
        assert_eq!(decode_all(&[0x08]), vec![KeyEvent::plain(Key::Backspace)]);
        assert_eq!(decode_all(&[0x7f]), vec![KeyEvent::plain(Key::Backspace)]);
    }

    #[test]
    fn ctrl_c_is_char_with_ctrl() {
        assert_eq!(
            decode_all(&[0x03]),
            vec![KeyEvent::new(Key::Char('c'), Modifiers::CTRL)]
        );
    }

    #[test]
    fn ctrl_letters() {
        // Ctrl+A = 0x01, Ctrl+Z = 0x1a
        assert_eq!(
            decode_all(&[0x01]),
            vec![KeyEvent::new(Key::Char('a'), Modifiers::CTRL)]
        );
        assert_eq!(
            decode_all(&[0x1a]),
            vec![KeyEvent::new(Key::Char('z'), Modifiers::CTRL)]
        );
    }

    // ── Escape sequences ─────────────────────────────────────────────

    #[test]
    fn bare_esc_times_out_to_esc_key() {
        assert_eq!(decode_all(&[0x1b]), vec![KeyEvent::plain(Key::Esc)]);
    }

    #[test]
    fn alt_key() {
        assert_eq!(
            decode_all(&[0x1b, b'x']),
            vec![KeyEvent::new(Key::Char('x'), Modifiers::ALT)]
        );
    }

    #[test]
    fn csi_arrows() {
        assert_eq!(decode_all(b"\x1b[A"), vec![KeyEvent::plain(Key::Up)]);
        assert_eq!(decode_all(b"\x1b[B"), vec![KeyEvent::plain(Key::Down)]);
        assert_eq!(decode_all(b"\x1b[C"), vec![KeyEvent::plain(Key::Right)]);
        assert_eq!(decode_all(b"\x1b[D"), vec![KeyEvent::plain(Key::Left)]);
    }

    #[test]
    fn csi_home_end() {
        assert_eq!(decode_all(b"\x1b[H"), vec![KeyEvent::plain(Key::Home)]);
        assert_eq!(decode_all(b"\x1b[F"), vec![KeyEvent::plain(Key::End)]);
    }

    #[test]
    fn csi_tilde_navigation() {
        assert_eq!(decode_all(b"\x1b[1~"), vec![KeyEvent::plain(Key::Home)]);
        assert_eq!(decode_all(b"\x1b[2~"), vec![KeyEvent::plain(Key::Insert)]);
        assert_eq!(decode_all(b"\x1b[3~"), vec![KeyEvent::plain(Key::Delete)]);
        assert_eq!(decode_all(b"\x1b[4~"), vec![KeyEvent::plain(Key::End)]);
        assert_eq!(decode_all(b"\x1b[5~"), vec![KeyEvent::plain(Key::PageUp)]);
        assert_eq!(decode_all(b"\x1b[6~"), vec![KeyEvent::plain(Key::PageDown)]);
    }

    #[test]
    fn csi_function_keys() {
        for (code, n) in [(15, 5), (17, 6), (18, 7), (19, 8), (20, 9), (21, 10), (23, 11), (24, 12)]
        {
            let seq = format!("\x1b[{code}~");
            assert_eq!(
                decode_all(seq.as_bytes()),
                vec![KeyEvent::plain(Key::F(n))],
                "for F{n}"
            );
        }
    }

    #[test]
    fn csi_modifier_half_is_ignored() {
        // Delete with Ctrl: the "5" after the semicolon is dropped.
        assert_eq!(decode_all(b"\x1b[3;5~"), vec![KeyEvent::plain(Key::Delete)]);
    }

    #[test]
    fn csi_unknown_tilde_param_emits_nothing() {
        assert_eq!(decode_all(b"\x1b[99~"), Vec::new());
    }

    #[test]
    fn ss3_function_keys() {
        assert_eq!(decode_all(b"\x1bOP"), vec![KeyEvent::plain(Key::F(1))]);
        assert_eq!(decode_all(b"\x1bOQ"), vec![KeyEvent::plain(Key::F(2))]);
        assert_eq!(decode_all(b"\x1bOR"), vec![KeyEvent::plain(Key::F(3))]);
        assert_eq!(decode_all(b"\x1bOS"), vec![KeyEvent::plain(Key::F(4))]);
    }

    #[test]
    fn ss3_application_arrows() {
        assert_eq!(decode_all(b"\x1bOA"), vec![KeyEvent::plain(Key::Up)]);
        assert_eq!(decode_all(b"\x1bOD"), vec![KeyEvent::plain(Key::Left)]);
    }

    #[test]
    fn sequence_then_text() {
        assert_eq!(
            decode_all(b"\x1b[Aq"),
            vec![KeyEvent::plain(Key::Up), KeyEvent::plain(Key::Char('q'))]
        );
    }

    #[test]
    fn done_flag_stops_loop() {
        let (tx, rx) = sync_channel::<u8>(8);
        let done = AtomicBool::new(true);
        let mut events = Vec::new();
        run(&rx, &done, &mut |ev| events.push(ev));
        drop(tx);
        assert!(events.is_empty());
    }
}
