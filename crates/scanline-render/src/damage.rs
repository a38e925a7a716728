#![forbid(unsafe_code)]

//! Damage detection between the presented and the drawn frame.
//!
//! A damage span is a half-open range of buffer indices whose cells all
//! share one style. Spans are *grouped* by style, not merely intersected,
//! so each span needs at most one SGR transition when emitted.
//!
//! # Algorithm
//!
//! One linear scan over both cell slices. Contiguous runs of differing
//! cells are collected raw, then split at style boundaries of the new
//! buffer. A size mismatch short-circuits to a single span covering the
//! whole new buffer (the caller redraws everything after a resize).
//! `O(N)` in the buffer size.

use std::ops::Range;

use scanline_core::style::Style;

use crate::buffer::Buffer;
use crate::cell::Cell;

/// A contiguous range of damaged cells sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageSpan {
    /// Half-open range of row-major buffer indices.
    pub range: Range<usize>,
    /// The style of every cell in the range.
    pub style: Style,
}

impl DamageSpan {
    /// Create a span.
    #[must_use]
    pub fn new(range: Range<usize>, style: Style) -> Self {
        Self { range, style }
    }

    /// Number of cells covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Whether the span covers no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Compute the damage of `back` relative to `front`.
pub fn damage(front: &Buffer, back: &Buffer) -> Vec<DamageSpan> {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!(
        "damage",
        width = back.size().width,
        height = back.size().height
    )
    .entered();

    if front.size() != back.size() {
        let mut spans = Vec::new();
        if !back.is_empty() {
            split_by_style(&mut spans, back.cells(), 0..back.len());
        }
        return spans;
    }

    let old = front.cells();
    let new = back.cells();

    let mut spans = Vec::new();
    let mut start: Option<usize> = None;

    for i in 0..new.len() {
        let differs = old[i] != new[i];
        match (start, differs) {
            (None, true) => start = Some(i),
            (Some(s), false) => {
                split_by_style(&mut spans, new, s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        split_by_style(&mut spans, new, s..new.len());
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(spans = spans.len(), "damage computed");

    spans
}

/// Split a raw damaged range into style-homogeneous spans.
fn split_by_style(spans: &mut Vec<DamageSpan>, cells: &[Cell], raw: Range<usize>) {
    if raw.is_empty() {
        return;
    }

    let mut start = raw.start;
    let mut style = cells[start].style;
    for i in raw.start + 1..raw.end {
        if cells[i].style != style {
            spans.push(DamageSpan::new(start..i, style));
            start = i;
            style = cells[i].style;
        }
    }
    spans.push(DamageSpan::new(start..raw.end, style));
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanline_core::geometry::{Position, Size};
    use scanline_core::style::{AnsiColor, Attributes, Color};

    fn pair(width: u16, height: u16) -> (Buffer, Buffer) {
        (
            Buffer::new(Size::new(width, height)),
            Buffer::new(Size::new(width, height)),
        )
    }

    #[test]
    fn identical_buffers_have_no_damage() {
        let (front, back) = pair(10, 4);
        assert!(damage(&front, &back).is_empty());
    }

    #[test]
    fn single_cell_change_is_one_span() {
        // Change only cell (2,3) on a 10×3 default buffer: exactly one
        // span covering index 12, default style.
        let (front, mut back) = pair(10, 3);
        back.set(Position::new(2, 3), Cell::new('X', Style::new()));

        let spans = damage(&front, &back);
        assert_eq!(
            spans,
            vec![DamageSpan::new(12..13, Style::new())]
        );
    }

    #[test]
    fn adjacent_changes_coalesce() {
        let (front, mut back) = pair(10, 1);
        back.write("abc", Position::new(1, 4), Style::new());

        let spans = damage(&front, &back);
        assert_eq!(spans, vec![DamageSpan::new(3..6, Style::new())]);
    }

    #[test]
    fn gap_splits_spans() {
        let (front, mut back) = pair(10, 1);
        back.set(Position::new(1, 1), Cell::new('a', Style::new()));
        back.set(Position::new(1, 5), Cell::new('b', Style::new()));

        let spans = damage(&front, &back);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].range, 0..1);
        assert_eq!(spans[1].range, 4..5);
    }

    #[test]
    fn style_boundary_splits_a_contiguous_run() {
        let (front, mut back) = pair(10, 1);
        let red = Style::new().with_foreground(Some(Color::ansi(AnsiColor::Red)));
        back.write("ab", Position::new(1, 1), Style::new());
        back.write("cd", Position::new(1, 3), red);
        back.write("ef", Position::new(1, 5), Style::new());

        let spans = damage(&front, &back);
        assert_eq!(
            spans,
            vec![
                DamageSpan::new(0..2, Style::new()),
                DamageSpan::new(2..4, red),
                DamageSpan::new(4..6, Style::new()),
            ]
        );
    }

    #[test]
    fn every_span_is_style_homogeneous() {
        let (front, mut back) = pair(20, 5);
        let bold = Style::new().with_attribute(Attributes::BOLD);
        back.write("hello world", Position::new(1, 1), Style::new());
        back.write("styled", Position::new(2, 4), bold);
        back.write("tail", Position::new(5, 17), Style::new());

        for span in damage(&front, &back) {
            for i in span.range.clone() {
                assert_eq!(back.cells()[i].style, span.style);
            }
        }
    }

    #[test]
    fn size_mismatch_damages_everything() {
        let front = Buffer::new(Size::new(8, 2));
        let back = Buffer::new(Size::new(10, 3));

        let spans = damage(&front, &back);
        let total: usize = spans.iter().map(DamageSpan::len).sum();
        assert_eq!(total, 30);
        assert_eq!(spans[0].range.start, 0);
        assert_eq!(spans.last().unwrap().range.end, 30);
        // A blank buffer is uniformly default-styled: one span.
        assert_eq!(spans, vec![DamageSpan::new(0..30, Style::new())]);
    }

    #[test]
    fn change_at_the_last_index_closes_the_open_span() {
        let (front, mut back) = pair(4, 1);
        back.set(Position::new(1, 4), Cell::new('z', Style::new()));
        let spans = damage(&front, &back);
        assert_eq!(spans, vec![DamageSpan::new(3..4, Style::new())]);
    }

    #[test]
    fn style_only_change_is_damage() {
        let (front, mut back) = pair(4, 1);
        let dim = Style::new().with_foreground(Some(Color::ansi(AnsiColor::Blue)));
        // Same character, different style.
        back.set(Position::new(1, 2), Cell::new(' ', dim));
        let spans = damage(&front, &back);
        assert_eq!(spans, vec![DamageSpan::new(1..2, dim)]);
    }
}
