//! Crate error type.

/// Errors from acquiring or releasing the terminal.
///
/// Note that a failure to enter raw mode is deliberately *not* an error:
/// the screen logs a warning and continues in cooked mode (see
/// [`crate::screen::Screen::new`]).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
