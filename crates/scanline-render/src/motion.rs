#![forbid(unsafe_code)]

//! Cursor-motion optimisation.
//!
//! Given where the cursor is and where it must go, pick the command list
//! whose *encoded length* is smallest in the session encoding. Candidates:
//!
//! - absolute `CursorPosition`
//! - `CursorNextLine` / `CursorPreviousLine` when the target column is 1
//! - `CursorHorizontalAbsolute`, `CursorForward`, `CursorBackward` within
//!   a row
//! - a vertical-then-horizontal composite
//!
//! The absolute form is always a candidate, so the chosen list never
//! encodes longer than a bare `CursorPosition`. An unknown `from` (the
//! renderer's frame-start sentinel) forces the absolute form.

use scanline_core::control::ControlSequence;
use scanline_core::encode::Encoding;
use scanline_core::geometry::Position;

/// Compute the byte-shortest command list moving the cursor `from → to`.
///
/// Returns an empty list when the cursor is already in place.
#[must_use]
pub fn optimise(from: Position, to: Position, encoding: Encoding) -> Vec<ControlSequence> {
    if from == to {
        return Vec::new();
    }

    let absolute = vec![ControlSequence::CursorPosition {
        row: to.row,
        column: to.column,
    }];
    if from == Position::UNKNOWN {
        return absolute;
    }

    let mut best = absolute;
    let mut best_len = sequence_len(encoding, &best);
    let mut consider = |candidate: Vec<ControlSequence>| {
        let len = sequence_len(encoding, &candidate);
        if len < best_len {
            best = candidate;
            best_len = len;
        }
    };

    // Line motions reach column 1 of another row in one command.
    if to.column == 1 && to.row > from.row {
        consider(vec![ControlSequence::CursorNextLine(to.row - from.row)]);
    }
    if to.column == 1 && to.row < from.row {
        consider(vec![ControlSequence::CursorPreviousLine(from.row - to.row)]);
    }

    let horizontal = horizontal_candidates(from.column, to.column);

    if to.row == from.row {
        for h in &horizontal {
            consider(vec![h.clone()]);
        }
    } else {
        let vertical = if to.row > from.row {
            ControlSequence::CursorDown(to.row - from.row)
        } else {
            ControlSequence::CursorUp(from.row - to.row)
        };
        if to.column == from.column {
            consider(vec![vertical]);
        } else {
            for h in &horizontal {
                consider(vec![vertical.clone(), h.clone()]);
            }
        }
    }

    best
}

/// Ways to move within a row (empty when the column is unchanged).
fn horizontal_candidates(from: u16, to: u16) -> Vec<ControlSequence> {
    if from == to {
        return Vec::new();
    }
    let mut candidates = vec![ControlSequence::CursorHorizontalAbsolute(to)];
    if to > from {
        candidates.push(ControlSequence::CursorForward(to - from));
    } else {
        candidates.push(ControlSequence::CursorBackward(from - to));
    }
    candidates
}

fn sequence_len(encoding: Encoding, sequences: &[ControlSequence]) -> usize {
    sequences.iter().map(|s| encoding.encoded_len(s)).sum()
}
