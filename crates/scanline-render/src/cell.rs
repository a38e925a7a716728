#![forbid(unsafe_code)]

//! Cell types and invariants.
//!
//! A `Cell` is one character column of the grid: a `(char, Style)` pair
//! occupying exactly **16 bytes** (4-byte scalar + 8-byte packed style +
//! padding), so a row is a dense, cache-friendly slice and cell comparison
//! is two machine words.
//!
//! # Wide characters
//!
//! A character of display width 2 occupies its leading cell; the following
//! cell is a **continuation**: its character is `'\0'` and its style
//! matches the leader. Continuation cells contribute no bytes to the output
//! stream; the leader's glyph already covers both columns.

use scanline_core::style::Style;

use crate::char_width;

/// One character cell: a scalar and its graphic rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

// Two words per cell, four cells per cache line.
const _: () = assert!(core::mem::size_of::<Cell>() == 16);

impl Cell {
    /// The blank cell: a space in the default style.
    pub const BLANK: Self = Self {
        ch: ' ',
        style: Style::DEFAULT,
    };

    /// Create a cell.
    #[inline]
    pub const fn new(ch: char, style: Style) -> Self {
        Self { ch, style }
    }

    /// The continuation cell that follows a wide leader, carrying the
    /// leader's style.
    #[inline]
    pub const fn continuation(style: Style) -> Self {
        Self { ch: '\0', style }
    }

    /// Whether this cell is the tail of a wide character.
    #[inline]
    pub const fn is_continuation(&self) -> bool {
        self.ch == '\0'
    }

    /// Display width of this cell's character (0 for continuations).
    #[inline]
    pub fn width(&self) -> usize {
        char_width(self.ch)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanline_core::style::{AnsiColor, Attributes, Color};

    #[test]
    fn cell_is_16_bytes() {
        assert_eq!(core::mem::size_of::<Cell>(), 16);
    }

    #[test]
    fn blank_is_space_in_default_style() {
        assert_eq!(Cell::BLANK.ch, ' ');
        assert!(Cell::BLANK.style.is_default());
        assert_eq!(Cell::default(), Cell::BLANK);
        assert!(!Cell::BLANK.is_continuation());
    }

    #[test]
    fn continuation_keeps_leader_style() {
        let style = Style::new()
            .with_foreground(Some(Color::ansi(AnsiColor::Magenta)))
            .with_attribute(Attributes::BOLD);
        let cont = Cell::continuation(style);
        assert!(cont.is_continuation());
        assert_eq!(cont.style, style);
        assert_eq!(cont.width(), 0);
    }

    #[test]
    fn equality_covers_char_and_style() {
        let a = Cell::new('x', Style::new().with_attribute(Attributes::BOLD));
        let b = Cell::new('x', Style::new().with_attribute(Attributes::BOLD));
        let c = Cell::new('x', Style::new());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Cell::new('y', a.style));
    }

    #[test]
    fn widths() {
        assert_eq!(Cell::new('A', Style::new()).width(), 1);
        assert_eq!(Cell::new('語', Style::new()).width(), 2);
        assert_eq!(Cell::continuation(Style::new()).width(), 0);
    }
}
