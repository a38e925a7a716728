#![forbid(unsafe_code)]

//! Canonical byte encodings for [`ControlSequence`].
//!
//! Two encodings exist: the portable 7-bit form introduces CSI as `ESC [`,
//! the 8-bit form as the single C1 byte `0x9B`. A given output session uses
//! exactly one encoding, chosen by the caller.
//!
//! # Parameter elision
//!
//! Numeric parameters equal to their default (1 for counts and coordinates,
//! 0 for erase extents) are elided. A position command with only the column
//! non-default keeps the separator and encodes as `;<column>H`.
//!
//! # Programming errors
//!
//! Encoding a response-shaped sequence (CPR, a device-attribute response)
//! or a DECFRA whose fill character falls outside the printable set
//! (32..=126 ∪ 160..=225) panics: these indicate a bug in the caller, not a
//! runtime condition.

use crate::capabilities::DeviceAttributes;
use crate::control::{ControlSequence, EraseExtent, Mode};

/// Control-sequence encoding selected for an output session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// `ESC [` introducer; works everywhere.
    #[default]
    SevenBit,
    /// Single-byte `0x9B` introducer, one byte shorter per sequence.
    EightBit,
}

impl Encoding {
    /// The CSI introducer bytes for this encoding.
    #[inline]
    pub const fn csi(self) -> &'static [u8] {
        match self {
            Self::SevenBit => b"\x1b[",
            Self::EightBit => b"\x9b",
        }
    }

    /// Encode a sequence into a fresh byte vector.
    #[must_use]
    pub fn encode(self, sequence: &ControlSequence) -> Vec<u8> {
        let mut out = Vec::with_capacity(12);
        self.encode_into(sequence, &mut out);
        out
    }

    /// Encoded length in bytes.
    ///
    /// The motion optimiser ranks candidate sequences by this measure.
    #[must_use]
    pub fn encoded_len(self, sequence: &ControlSequence) -> usize {
        let mut out = Vec::with_capacity(12);
        self.encode_into(sequence, &mut out);
        out.len()
    }

    /// Append the canonical encoding of `sequence` to `out`.
    ///
    /// # Panics
    ///
    /// Panics on response-shaped sequences and on a non-printable DECFRA
    /// fill character (programming errors, see module docs).
    pub fn encode_into(self, sequence: &ControlSequence, out: &mut Vec<u8>) {
        use ControlSequence as C;

        assert!(
            !sequence.is_response(),
            "response-shaped control sequence is not valid output: {sequence:?}"
        );

        out.extend_from_slice(self.csi());
        match sequence {
            C::CursorUp(n) => count_final(out, *n, b'A'),
            C::CursorDown(n) => count_final(out, *n, b'B'),
            C::CursorForward(n) => count_final(out, *n, b'C'),
            C::CursorBackward(n) => count_final(out, *n, b'D'),
            C::CursorNextLine(n) => count_final(out, *n, b'E'),
            C::CursorPreviousLine(n) => count_final(out, *n, b'F'),
            C::CursorHorizontalAbsolute(column) => count_final(out, *column, b'G'),
            C::CursorPosition { row, column } => {
                if *row != 1 {
                    push_num(out, *row);
                }
                if *column != 1 {
                    out.push(b';');
                    push_num(out, *column);
                }
                out.push(b'H');
            }
            C::ErasePage(extent) => erase_final(out, *extent, b'J'),
            C::EraseLine(extent) => erase_final(out, *extent, b'K'),
            C::EraseField(extent) => erase_final(out, *extent, b'N'),
            C::EraseArea(extent) => erase_final(out, *extent, b'O'),
            C::ScrollUp(n) => count_final(out, *n, b'S'),
            C::ScrollDown(n) => count_final(out, *n, b'T'),
            C::Repeat(n) => count_final(out, *n, b'b'),
            C::SelectGraphicRendition(renditions) => {
                for (i, rendition) in renditions.iter().enumerate() {
                    if i > 0 {
                        out.push(b';');
                    }
                    rendition.write_params(out);
                }
                out.push(b'm');
            }
            C::SetMode(mode) => private_mode(out, *mode, b'h'),
            C::ResetMode(mode) => private_mode(out, *mode, b'l'),
            C::FillRectangularArea {
                character,
                top,
                left,
                bottom,
                right,
            } => {
                let code = *character as u32;
                assert!(
                    (32..=126).contains(&code) || (160..=225).contains(&code),
                    "DECFRA fill character {character:?} (U+{code:04X}) is not printable"
                );
                push_num32(out, code);
                for param in [top, left, bottom, right] {
                    out.push(b';');
                    push_num(out, *param);
                }
                out.extend_from_slice(b"$x");
            }
            C::DeviceAttributes(DeviceAttributes::Request) => out.push(b'c'),
            // is_response() rules these out above.
            C::DeviceAttributes(_) | C::CursorPositionReport { .. } => unreachable!(),
        }
    }
}

#[inline]
fn push_num(out: &mut Vec<u8>, n: u16) {
    out.extend_from_slice(n.to_string().as_bytes());
}

#[inline]
fn push_num32(out: &mut Vec<u8>, n: u32) {
    out.extend_from_slice(n.to_string().as_bytes());
}

/// Count parameter with default 1 elided, then the final byte.
#[inline]
fn count_final(out: &mut Vec<u8>, n: u16, final_byte: u8) {
    if n != 1 {
        push_num(out, n);
    }
    out.push(final_byte);
}

/// Erase-extent parameter with default 0 elided, then the final byte.
#[inline]
fn erase_final(out: &mut Vec<u8>, extent: EraseExtent, final_byte: u8) {
    if extent.selector() != 0 {
        push_num(out, extent.selector());
    }
    out.push(final_byte);
}

/// DEC private mode: `? Pm h` / `? Pm l`.
#[inline]
fn private_mode(out: &mut Vec<u8>, mode: Mode, final_byte: u8) {
    out.push(b'?');
    push_num(out, mode.number());
    out.push(final_byte);
}
