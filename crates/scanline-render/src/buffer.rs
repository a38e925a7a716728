#![forbid(unsafe_code)]

//! The cell grid.
//!
//! A `Buffer` is a size plus a densely packed row-major `Vec<Cell>`,
//! uniquely owned by the renderer that created it. All access is
//! bounds-forgiving: out-of-bounds reads yield the blank cell and
//! out-of-bounds writes are silent no-ops, so drawing code never has to
//! clip defensively.
//!
//! # Cursor semantics of `write`
//!
//! `write` walks a string from a start position like a terminal would:
//! `\n` advances exactly one row, `\r` returns to column 1, `\t` advances
//! to the next multiple-of-8 column (clamped to the last column), width-0
//! characters are ignored, and a width-2 character whose leader would sit
//! on the rightmost column wraps to the next row before being placed.

use scanline_core::geometry::{Position, Rect, Size};
use scanline_core::style::Style;

use crate::cell::Cell;

/// A row-major grid of cells.
#[derive(Debug)]
pub struct Buffer {
    size: Size,
    cells: Vec<Cell>,
}

impl Buffer {
    /// Create a buffer of the given size, filled with blank cells.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            cells: vec![Cell::BLANK; size.area()],
        }
    }

    /// Grid dimensions.
    #[inline]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Raw access to the cell slice, for diffing.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Read the cell at `pos`. Out of bounds yields [`Cell::BLANK`].
    #[inline]
    pub fn get(&self, pos: Position) -> Cell {
        if pos.valid(self.size) {
            self.cells[pos.offset(self.size)]
        } else {
            Cell::BLANK
        }
    }

    /// Write a single cell at `pos`.
    ///
    /// Out of bounds is a no-op, as is a width-0 character. A width-2
    /// character is written atomically with its continuation cell; if the
    /// continuation column would fall outside the row, nothing is written.
    pub fn set(&mut self, pos: Position, cell: Cell) {
        if !pos.valid(self.size) {
            return;
        }
        match cell.width() {
            0 => {}
            1 => self.cells[pos.offset(self.size)] = cell,
            _ => {
                if pos.column >= self.size.width {
                    return;
                }
                let i = pos.offset(self.size);
                self.cells[i] = cell;
                self.cells[i + 1] = Cell::continuation(cell.style);
            }
        }
    }

    /// Write a string starting at `pos`, returning the final cursor
    /// position. An invalid start position returns without effect.
    pub fn write(&mut self, text: &str, pos: Position, style: Style) -> Position {
        if !pos.valid(self.size) {
            return pos;
        }

        let mut row = pos.row;
        let mut column = pos.column;

        for ch in text.chars() {
            match ch {
                '\n' => row += 1,
                '\r' => column = 1,
                '\t' => column = ((column / 8 + 1) * 8).min(self.size.width),
                _ => match crate::char_width(ch) {
                    0 => {}
                    1 => {
                        self.set(Position::new(row, column), Cell::new(ch, style));
                        column += 1;
                        if column > self.size.width {
                            column = 1;
                            row += 1;
                        }
                    }
                    _ => {
                        if self.size.width < 2 {
                            continue;
                        }
                        // A leader on the rightmost column wraps first.
                        if column >= self.size.width {
                            column = 1;
                            row += 1;
                        }
                        self.set(Position::new(row, column), Cell::new(ch, style));
                        column += 2;
                        if column > self.size.width {
                            column = 1;
                            row += 1;
                        }
                    }
                },
            }
        }

        Position::new(row, column)
    }

    /// Fill a rectangle with a character, clipped to the buffer bounds.
    ///
    /// An empty clipped rectangle writes nothing. Wide fill characters
    /// step by their width.
    pub fn fill(&mut self, rect: Rect, ch: char, style: Style) {
        let clipped = rect.intersection(&Rect::from_size(self.size));
        if clipped.is_empty() {
            return;
        }

        let step = crate::char_width(ch).max(1) as u16;
        for y in clipped.y..clipped.bottom() {
            let mut x = clipped.x;
            while x < clipped.right() {
                self.set(
                    Position::new(y + 1, x + 1),
                    Cell::new(ch, style),
                );
                x += step;
            }
        }
    }

    /// Reset every cell to blank.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }
}
