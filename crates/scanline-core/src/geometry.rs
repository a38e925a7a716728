#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Two coordinate systems coexist:
//!
//! - **Geometric** (`Point`, `Rect`): 0-indexed, origin at the top-left,
//!   used for clipping and mouse hit testing.
//! - **Terminal** (`Position`): 1-indexed `(row, column)` with origin
//!   `(1, 1)`, the addressing scheme of the wire protocol. Converting a
//!   `Point` adds 1 to each axis.

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    /// Columns.
    pub width: u16,
    /// Rows.
    pub height: u16,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Total number of cells.
    #[inline]
    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check if either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A 0-indexed point in cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// A 1-indexed terminal position: `(row, column)` with origin `(1, 1)`.
///
/// This is the addressing scheme of cursor-motion control sequences. A
/// position is *valid in* a [`Size`] when `1 ≤ row ≤ height` and
/// `1 ≤ column ≤ width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: u16,
    pub column: u16,
}

impl Position {
    /// The top-left corner of the screen.
    pub const ORIGIN: Self = Self { row: 1, column: 1 };

    /// Sentinel for "cursor position unknown".
    ///
    /// Never valid in any size; forces the motion optimiser to emit an
    /// absolute position.
    pub const UNKNOWN: Self = Self {
        row: u16::MAX,
        column: u16::MAX,
    };

    /// Create a new position. Row and column are 1-based.
    #[inline]
    pub const fn new(row: u16, column: u16) -> Self {
        Self { row, column }
    }

    /// Convert a 0-based geometric point by adding 1 to each axis.
    #[inline]
    pub const fn from_point(point: Point) -> Self {
        Self {
            row: point.y + 1,
            column: point.x + 1,
        }
    }

    /// Whether this position addresses a cell inside `size`.
    #[inline]
    pub const fn valid(&self, size: Size) -> bool {
        self.row >= 1 && self.row <= size.height && self.column >= 1 && self.column <= size.width
    }

    /// Linear row-major offset: `(row-1) * width + (column-1)`.
    ///
    /// Only meaningful for positions valid in `size`.
    #[inline]
    pub const fn offset(&self, size: Size) -> usize {
        (self.row as usize - 1) * size.width as usize + (self.column as usize - 1)
    }

    /// Reconstruct a position from a linear row-major offset.
    ///
    /// Inverse of [`Position::offset`] for offsets in `0..size.area()`.
    #[inline]
    pub const fn from_offset(offset: usize, size: Size) -> Self {
        let width = size.width as usize;
        Self {
            row: (offset / width) as u16 + 1,
            column: (offset % width) as u16 + 1,
        }
    }

    /// Same row, different column.
    #[inline]
    pub const fn with_column(&self, column: u16) -> Self {
        Self {
            row: self.row,
            column,
        }
    }
}

/// A 0-indexed rectangle for clipping and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle at the origin covering `size`.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns an empty rectangle when the rectangles don't overlap.
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Rect::new(x, y, right - x, bottom - y)
        } else {
            Rect::default()
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::{Position, Size};
    use proptest::prelude::*;

    proptest! {
        /// For every index i in [0, area), from_offset(i) is valid and
        /// round-trips back to i.
        #[test]
        fn offset_round_trips(
            width in 1u16..200,
            height in 1u16..100,
            seed in any::<usize>(),
        ) {
            let size = Size::new(width, height);
            let i = seed % size.area();
            let p = Position::from_offset(i, size);
            prop_assert!(p.valid(size));
            prop_assert_eq!(p.offset(size), i);
        }

        /// Every valid position has an offset inside [0, area).
        #[test]
        fn valid_positions_have_in_range_offsets(
            width in 1u16..200,
            height in 1u16..100,
            row in 1u16..100,
            column in 1u16..200,
        ) {
            let size = Size::new(width, height);
            let p = Position::new(row.min(height), column.min(width));
            prop_assert!(p.valid(size));
            prop_assert!(p.offset(size) < size.area());
        }
    }
}
