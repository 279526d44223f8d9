//! Cell styles and the ANSI-16 color names the markup dialect understands.

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// A named ANSI-16 foreground/background color.
///
/// This is the whole palette the markup dialect accepts; true color is out
/// of scope. `Grey` is the bright-black slot (SGR 90).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Grey,
}

impl Color {
    /// Look up a color by its markup name. Unknown names yield `None` and
    /// render plain.
    pub fn from_name(name: &str) -> Option<Color> {
        match name {
            "black" => Some(Color::Black),
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "yellow" => Some(Color::Yellow),
            "blue" => Some(Color::Blue),
            "magenta" => Some(Color::Magenta),
            "cyan" => Some(Color::Cyan),
            "white" => Some(Color::White),
            "grey" => Some(Color::Grey),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// Visual style of a cell: attribute bits plus optional named colors.
///
/// A pure value; merging is child-over-parent (see [`Style::merge_over`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub bold: bool,
    pub dim: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub reverse: bool,
    pub blink: bool,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
}

impl Style {
    pub const fn new() -> Style {
        Style {
            bold: false,
            dim: false,
            italic: false,
            underline: false,
            strike: false,
            reverse: false,
            blink: false,
            fg: None,
            bg: None,
        }
    }

    pub const fn bold() -> Style {
        let mut style = Style::new();
        style.bold = true;
        style
    }

    pub const fn dim() -> Style {
        let mut style = Style::new();
        style.dim = true;
        style
    }

    pub const fn italic() -> Style {
        let mut style = Style::new();
        style.italic = true;
        style
    }

    pub const fn underline() -> Style {
        let mut style = Style::new();
        style.underline = true;
        style
    }

    pub const fn strike() -> Style {
        let mut style = Style::new();
        style.strike = true;
        style
    }

    pub const fn reverse() -> Style {
        let mut style = Style::new();
        style.reverse = true;
        style
    }

    pub const fn fg(color: Color) -> Style {
        let mut style = Style::new();
        style.fg = Some(color);
        style
    }

    pub const fn bg(color: Color) -> Style {
        let mut style = Style::new();
        style.bg = Some(color);
        style
    }

    /// Merge `child` over `self`: any set attribute bit wins, colors use
    /// child-set-else-parent.
    pub fn merge_over(self, child: Style) -> Style {
        Style {
            bold: self.bold || child.bold,
            dim: self.dim || child.dim,
            italic: self.italic || child.italic,
            underline: self.underline || child.underline,
            strike: self.strike || child.strike,
            reverse: self.reverse || child.reverse,
            blink: self.blink || child.blink,
            fg: child.fg.or(self.fg),
            bg: child.bg.or(self.bg),
        }
    }

    /// Whether any attribute or color is set.
    pub fn is_plain(&self) -> bool {
        *self == Style::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
