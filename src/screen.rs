//! The double-buffered terminal screen.
//!
//! [`Screen`] owns two [`Buffer`]s: Front mirrors what is on the terminal,
//! Back is the draw target. [`Screen::frame`] runs one atomic render cycle
//! under the screen's exclusive section — blank the back buffer, draw, then
//! diff back against front and emit the minimal ANSI stream through a
//! buffered writer. Cursor moves are skipped while writes land at the
//! predicted cursor position, and style escapes are only emitted when the
//! style actually changes.
//!
//! A real screen ([`Screen::new`]) also owns the raw-mode lifecycle, a
//! resize watcher, and the input pump. [`Screen::with_backend`] builds a
//! headless screen over any writer for tests and fake terminals.

use std::fmt;
use std::io::{self, BufWriter, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::mpsc::{sync_channel, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal;
use crossterm::Command;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::buffer::{Buffer, Cell};
use crate::error::Error;
use crate::event::{decoder, KeyEvent};
use crate::markup::{Color, Style};

/// How often the resize watcher re-queries the terminal size.
const RESIZE_POLL: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// What the terminal can render. Italic falls back to dim without the
/// capability; strike is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub italic: bool,
    pub strike: bool,
}

impl Capabilities {
    /// Everything supported. Headless screens start here.
    pub fn full() -> Capabilities {
        Capabilities {
            italic: true,
            strike: true,
        }
    }

    /// Sniff `$TERM` for a terminal family known to support italic and
    /// strike-through.
    fn detect() -> Capabilities {
        let term = std::env::var("TERM").unwrap_or_default();
        let known = ["xterm", "truecolor", "alacritty", "kitty", "screen", "tmux"];
        let supported = known.iter().any(|name| term.contains(name));
        Capabilities {
            italic: supported,
            strike: supported,
        }
    }
}

// ---------------------------------------------------------------------------
// Terminal (the exclusive section)
// ---------------------------------------------------------------------------

/// Everything guarded by the screen's one lock: both buffers, the ANSI
/// writer, and the capability flags.
struct Terminal {
    front: Buffer,
    back: Buffer,
    out: Box<dyn Write + Send>,
    caps: Capabilities,
}

impl Terminal {
    /// Diff back against front, emit the minimal ANSI stream, flush, and
    /// absorb the back buffer into front. Write errors are dropped for this
    /// frame; the next frame tries again.
    fn diff_and_flush(&mut self) {
        if let Err(err) = self.emit_diff() {
            debug!(%err, "dropping frame output");
        }
    }

    fn emit_diff(&mut self) -> io::Result<()> {
        let w = self.back.width();
        let h = self.back.height();
        let mut cursor: Option<(i32, i32)> = None;
        let mut last_style = Style::new();
        let mut style_active = false;

        for y in 0..h {
            for x in 0..w {
                let idx = (y * w + x) as usize;
                let cell = self.back.cells()[idx];
                if cell == self.front.cells()[idx] {
                    continue;
                }

                if cursor != Some((x, y)) {
                    queue!(self.out, MoveTo(x as u16, y as u16))?;
                }

                if !style_active || cell.style != last_style {
                    if style_active {
                        queue!(self.out, SetAttribute(Attribute::Reset))?;
                    }
                    write_style(&mut self.out, cell.style, self.caps)?;
                    last_style = cell.style;
                    style_active = true;
                }

                let ch = if cell.ch == '\0' { ' ' } else { cell.ch };
                queue!(self.out, Print(ch))?;
                cursor = Some((x + 1, y));

                self.front.cells_mut()[idx] = cell;
            }
        }

        if style_active {
            queue!(self.out, SetAttribute(Attribute::Reset))?;
        }
        self.out.flush()
    }
}

/// Queue the SGR escapes for `style` in fixed order: bold, dim, italic,
/// underline, strike, reverse, blink, fg, bg.
fn write_style<W: Write>(out: &mut W, style: Style, caps: Capabilities) -> io::Result<()> {
    if style.bold {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.dim {
        queue!(out, SetAttribute(Attribute::Dim))?;
    }
    if style.italic {
        if caps.italic {
            queue!(out, SetAttribute(Attribute::Italic))?;
        } else {
            queue!(out, SetAttribute(Attribute::Dim))?;
        }
    }
    if style.underline {
        queue!(out, SetAttribute(Attribute::Underlined))?;
    }
    if style.strike && caps.strike {
        queue!(out, SetAttribute(Attribute::CrossedOut))?;
    }
    if style.reverse {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }
    if style.blink {
        queue!(out, SetAttribute(Attribute::SlowBlink))?;
    }
    if let Some(fg) = style.fg {
        queue!(out, SgrColor(fg_code(fg)))?;
    }
    if let Some(bg) = style.bg {
        queue!(out, SgrColor(bg_code(bg)))?;
    }
    Ok(())
}

/// One classic SGR color code. Crossterm's own color commands speak the
/// 256-color form (`38;5;n`); this library emits only the 16-color set.
struct SgrColor(u8);

impl Command for SgrColor {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "\x1b[{}m", self.0)
    }
}

/// Foreground SGR code: 30–37, with grey on the bright-black slot (90).
fn fg_code(color: Color) -> u8 {
    match color {
        Color::Black => 30,
        Color::Red => 31,
        Color::Green => 32,
        Color::Yellow => 33,
        Color::Blue => 34,
        Color::Magenta => 35,
        Color::Cyan => 36,
        Color::White => 37,
        Color::Grey => 90,
    }
}

/// Background SGR code: 40–47 / 100.
fn bg_code(color: Color) -> u8 {
    fg_code(color) + 10
}

// ---------------------------------------------------------------------------
// Screen
// ---------------------------------------------------------------------------

struct ScreenInner {
    term: Mutex<Terminal>,
    scroll_y: AtomicI32,
    done: Arc<AtomicBool>,
    raw_mode: AtomicBool,
    key_callbacks: Mutex<Vec<Box<dyn FnMut(KeyEvent) + Send>>>,
    resize_callbacks: Mutex<Vec<Box<dyn FnMut(i32, i32) + Send>>>,
}

/// Handle to the terminal display. Cheap to clone; clones share one screen.
#[derive(Clone)]
pub struct Screen {
    inner: Arc<ScreenInner>,
}

impl Screen {
    /// Acquire the real terminal: detect size (80×24 fallback) and
    /// capabilities, enter raw mode, hide the cursor, start the input pump
    /// and resize watcher.
    ///
    /// Raw-mode failure is not fatal — a warning is logged and input
    /// arrives however the OS delivers it.
    pub fn new() -> Result<Screen, Error> {
        let (width, height) = terminal::size().unwrap_or((80, 24));
        let caps = Capabilities::detect();

        let raw_mode = match terminal::enable_raw_mode() {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "failed to enable raw mode; continuing in cooked mode");
                false
            }
        };

        let mut out: Box<dyn Write + Send> =
            Box::new(BufWriter::with_capacity(64 * 1024, io::stdout()));
        queue!(out, Hide)?;
        out.flush()?;

        let screen = Screen {
            inner: Arc::new(ScreenInner {
                term: Mutex::new(Terminal {
                    front: Buffer::new(width as i32, height as i32),
                    back: Buffer::new(width as i32, height as i32),
                    out,
                    caps,
                }),
                scroll_y: AtomicI32::new(0),
                done: Arc::new(AtomicBool::new(false)),
                raw_mode: AtomicBool::new(raw_mode),
                key_callbacks: Mutex::new(Vec::new()),
                resize_callbacks: Mutex::new(Vec::new()),
            }),
        };

        screen.spawn_input_pump();
        screen.spawn_resize_watcher();
        Ok(screen)
    }

    /// Build a headless screen over an arbitrary writer.
    ///
    /// No raw mode, no input pump, no resize watcher; capabilities start at
    /// [`Capabilities::full`]. Used for tests and fake terminals.
    pub fn with_backend(width: i32, height: i32, out: Box<dyn Write + Send>) -> Screen {
        Screen {
            inner: Arc::new(ScreenInner {
                term: Mutex::new(Terminal {
                    front: Buffer::new(width, height),
                    back: Buffer::new(width, height),
                    out,
                    caps: Capabilities::full(),
                }),
                scroll_y: AtomicI32::new(0),
                done: Arc::new(AtomicBool::new(false)),
                raw_mode: AtomicBool::new(false),
                key_callbacks: Mutex::new(Vec::new()),
                resize_callbacks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Release the terminal: stop the pump and watcher, show the cursor,
    /// park it below the last row, and restore the terminal mode.
    pub fn close(&self) {
        self.inner.done.store(true, Ordering::Release);

        {
            let mut term = self.inner.term.lock();
            let height = term.back.height().max(0) as u16;
            let restored = queue!(term.out, Show, MoveTo(0, height))
                .and_then(|_| term.out.flush());
            if let Err(err) = restored {
                debug!(%err, "error restoring cursor");
            }
        }

        if self.inner.raw_mode.swap(false, Ordering::AcqRel) {
            if let Err(err) = terminal::disable_raw_mode() {
                warn!(%err, "failed to restore terminal mode");
            }
        }
    }

    /// Run one atomic frame: blank the back buffer, let `draw` fill it,
    /// then diff and flush. The whole cycle holds the exclusive section, so
    /// no partial frame is ever observable.
    pub fn frame(&self, draw: impl FnOnce(&mut Buffer)) {
        let mut term = self.inner.term.lock();
        term.back.fill(Cell::SPACE);
        draw(&mut term.back);
        term.diff_and_flush();
    }

    /// Blank the back buffer. Convenience wrapper; use [`Screen::frame`]
    /// during render passes.
    pub fn clear(&self) {
        self.inner.term.lock().back.fill(Cell::SPACE);
    }

    /// Diff and flush the back buffer as-is.
    pub fn render(&self) {
        self.inner.term.lock().diff_and_flush();
    }

    /// Write a string into the back buffer.
    pub fn draw_text(&self, x: i32, y: i32, text: &str, style: Style) {
        self.inner.term.lock().back.draw_text(x, y, text, style);
    }

    /// Current buffer dimensions.
    pub fn size(&self) -> (i32, i32) {
        let term = self.inner.term.lock();
        (term.back.width(), term.back.height())
    }

    pub fn capabilities(&self) -> Capabilities {
        self.inner.term.lock().caps
    }

    pub fn set_capabilities(&self, caps: Capabilities) {
        self.inner.term.lock().caps = caps;
    }

    /// Vertical scroll offset applied by the renderer.
    pub fn scroll_y(&self) -> i32 {
        self.inner.scroll_y.load(Ordering::Acquire)
    }

    pub fn set_scroll_y(&self, offset: i32) {
        self.inner.scroll_y.store(offset, Ordering::Release);
    }

    /// Register a callback for every decoded key event. Callbacks run on
    /// the input decoder thread.
    pub fn on_key(&self, callback: impl FnMut(KeyEvent) + Send + 'static) {
        self.inner.key_callbacks.lock().push(Box::new(callback));
    }

    /// Register a callback for terminal size changes.
    pub fn on_resize(&self, callback: impl FnMut(i32, i32) + Send + 'static) {
        self.inner.resize_callbacks.lock().push(Box::new(callback));
    }

    /// Resize both buffers, invalidating the front buffer so the next
    /// frame redraws every cell, and notify resize callbacks.
    pub fn resize(&self, width: i32, height: i32) {
        apply_resize(&self.inner, width, height);
    }

    /// Read a cell of the *back* buffer (what the next flush will show).
    /// Mainly useful for assertions against headless screens.
    pub fn back_cell(&self, x: i32, y: i32) -> Cell {
        self.inner.term.lock().back.get(x, y)
    }

    /// Snapshot the back buffer.
    pub fn back_snapshot(&self) -> Buffer {
        self.inner.term.lock().back.clone()
    }

    /// Snapshot the front buffer (what is on the terminal).
    pub fn front_snapshot(&self) -> Buffer {
        self.inner.term.lock().front.clone()
    }

    // -- background threads -------------------------------------------------

    fn spawn_input_pump(&self) {
        let (tx, rx) = sync_channel::<u8>(128);

        let done = self.inner.done.clone();
        thread::spawn(move || reader_loop(tx, done));

        let inner = self.inner.clone();
        thread::spawn(move || {
            let done = inner.done.clone();
            let mut emit = |event: KeyEvent| {
                for callback in inner.key_callbacks.lock().iter_mut() {
                    callback(event);
                }
            };
            decoder::run(&rx, &done, &mut emit);
        });
    }

    fn spawn_resize_watcher(&self) {
        let inner = self.inner.clone();
        thread::spawn(move || {
            while !inner.done.load(Ordering::Acquire) {
                thread::sleep(RESIZE_POLL);
                let Ok((width, height)) = terminal::size() else {
                    continue;
                };
                let (width, height) = (width as i32, height as i32);
                let current = {
                    let term = inner.term.lock();
                    (term.back.width(), term.back.height())
                };
                if current != (width, height) {
                    debug!(width, height, "terminal resized");
                    apply_resize(&inner, width, height);
                }
            }
        });
    }
}

fn apply_resize(inner: &ScreenInner, width: i32, height: i32) {
    {
        let mut term = inner.term.lock();
        term.front.resize(width, height);
        term.back.resize(width, height);
        // Invalidate front so the next diff rewrites every cell.
        term.front.fill(Cell::BLANK);
    }
    for callback in inner.resize_callbacks.lock().iter_mut() {
        callback(width, height);
    }
}

/// Move raw bytes from stdin into the pump channel. Exits on EOF, on read
/// error, or once the screen is closed.
fn reader_loop(tx: SyncSender<u8>, done: Arc<AtomicBool>) {
    let mut stdin = io::stdin();
    let mut buf = [0u8; 256];
    loop {
        match stdin.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => {
                for &byte in &buf[..n] {
                    if done.load(Ordering::Acquire) {
                        return;
                    }
                    if tx.send(byte).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
