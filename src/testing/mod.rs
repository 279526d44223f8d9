//! Test support: headless capture, buffer snapshots, ANSI replay.
//!
//! These helpers pair with [`Screen::with_backend`](crate::screen::Screen::with_backend)
//! to exercise the full render path without a terminal: capture the emitted
//! byte stream, snapshot buffers as text, and re-apply a byte stream to a
//! buffer to verify the diff is lossless.

mod replay;
mod snapshot;

pub use replay::apply_ansi;
pub use snapshot::buffer_to_string;

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// CaptureWriter
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CaptureState {
    bytes: Vec<u8>,
    flushes: usize,
}

/// A `Write` sink that records everything, shared across clones.
///
/// Hand one clone to [`Screen::with_backend`] and keep the other to inspect
/// the emitted ANSI stream.
///
/// [`Screen::with_backend`]: crate::screen::Screen::with_backend
#[derive(Clone, Default)]
pub struct CaptureWriter {
    state: Arc<Mutex<CaptureState>>,
}

impl CaptureWriter {
    pub fn new() -> CaptureWriter {
        CaptureWriter::default()
    }

    /// Drain and return everything written since the last take.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut self.state.lock().bytes)
    }

    /// Number of flushes seen so far (one per emitted frame).
    pub fn flush_count(&self) -> usize {
        self.state.lock().flushes
    }
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.lock().bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.lock().flushes += 1;
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
