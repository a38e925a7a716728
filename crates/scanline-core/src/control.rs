#![forbid(unsafe_code)]

//! The control-sequence alphabet.
//!
//! One closed sum type enumerates every ISO 6429 / ECMA-48 command the
//! engine emits, plus the response-shaped sequences the input parser
//! recognises. The encoder ([`crate::encode`]) gives each variant a
//! canonical byte string; exhaustive matching there is the correctness
//! argument for the wire format.
//!
//! # Command reference
//!
//! | Variant                    | Final | Mnemonic  |
//! |----------------------------|-------|-----------|
//! | `CursorUp/Down/Fwd/Back`   | A B C D | CUU CUD CUF CUB |
//! | `CursorNextLine/PrevLine`  | E F   | CNL CPL   |
//! | `CursorHorizontalAbsolute` | G     | CHA       |
//! | `CursorPosition`           | H     | CUP       |
//! | `ErasePage/Line/Field/Area`| J K N O | ED EL EF EA |
//! | `ScrollUp/Down`            | S T   | SU SD     |
//! | `Repeat`                   | b     | REP       |
//! | `SelectGraphicRendition`   | m     | SGR       |
//! | `SetMode/ResetMode`        | ? h/l | DECSET/DECRST |
//! | `FillRectangularArea`      | $ x   | DECFRA    |
//! | `DeviceAttributes`         | c     | DA1       |
//! | `CursorPositionReport`     | R     | CPR (response) |

use crate::capabilities::DeviceAttributes;
use crate::style::{AnsiColor, Color, Intensity};

/// Extent selector for the erase commands (ED/EL/EF/EA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EraseExtent {
    /// From the active position to the end (parameter 0, elided).
    #[default]
    ToEnd,
    /// From the start to the active position (parameter 1).
    ToStart,
    /// The whole page/line/field/area (parameter 2).
    All,
}

impl EraseExtent {
    /// Numeric selector; `ToEnd` is the default and is elided on the wire.
    #[inline]
    pub const fn selector(self) -> u16 {
        match self {
            Self::ToEnd => 0,
            Self::ToStart => 1,
            Self::All => 2,
        }
    }
}

/// DEC private modes the engine sets and resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// DECAWM: auto-wrap at the right margin (mode 7).
    AutoWrap,
    /// DECTCEM: cursor visibility (mode 25).
    CursorVisible,
    /// Alternate screen buffer with save/restore (mode 1049).
    AlternateScreen,
    /// Bracketed paste (mode 2004).
    BracketedPaste,
    /// Synchronized update (mode 2026): the terminal buffers drawing
    /// between set and reset so no intermediate frame is visible.
    SynchronizedUpdate,
}

impl Mode {
    /// The private-mode parameter number.
    #[inline]
    pub const fn number(self) -> u16 {
        match self {
            Self::AutoWrap => 7,
            Self::CursorVisible => 25,
            Self::AlternateScreen => 1049,
            Self::BracketedPaste => 2004,
            Self::SynchronizedUpdate => 2026,
        }
    }
}

/// One graphic-rendition parameter of an SGR command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphicRendition {
    /// Reset every attribute and color (0).
    Reset,
    Bold,
    Italic,
    Underline,
    Blink,
    Strikethrough,
    /// Normal intensity, the bold off-code (22).
    NormalIntensity,
    ItalicOff,
    UnderlineOff,
    BlinkOff,
    StrikethroughOff,
    /// Foreground color; `None` selects the terminal default (39).
    Foreground(Option<Color>),
    /// Background color; `None` selects the terminal default (49).
    Background(Option<Color>),
}

impl GraphicRendition {
    /// Append this rendition's parameter string to `out`.
    ///
    /// Attribute codes are single parameters; colors may expand to the
    /// extended `38;2;r;g;b` form.
    pub fn write_params(&self, out: &mut Vec<u8>) {
        match self {
            Self::Reset => out.push(b'0'),
            Self::Bold => out.push(b'1'),
            Self::Italic => out.push(b'3'),
            Self::Underline => out.push(b'4'),
            Self::Blink => out.push(b'5'),
            Self::Strikethrough => out.push(b'9'),
            Self::NormalIntensity => out.extend_from_slice(b"22"),
            Self::ItalicOff => out.extend_from_slice(b"23"),
            Self::UnderlineOff => out.extend_from_slice(b"24"),
            Self::BlinkOff => out.extend_from_slice(b"25"),
            Self::StrikethroughOff => out.extend_from_slice(b"29"),
            Self::Foreground(color) => write_color_params(out, *color, 30),
            Self::Background(color) => write_color_params(out, *color, 40),
        }
    }
}

/// Render a color parameter with the given base (30 foreground, 40
/// background). Bright palette colors shift to 90/100; the default color
/// is base + 9; RGB uses the extended `base+8;2;r;g;b` form.
fn write_color_params(out: &mut Vec<u8>, color: Option<Color>, base: u16) {
    fn push_num(out: &mut Vec<u8>, n: u16) {
        out.extend_from_slice(n.to_string().as_bytes());
    }
    match color {
        None | Some(Color::Ansi(AnsiColor::Default, _)) => push_num(out, base + 9),
        Some(Color::Ansi(name, intensity)) => {
            // index() is Some for every non-Default name.
            let index = u16::from(name.index().unwrap_or(0));
            let offset = match intensity {
                Intensity::Normal => base,
                Intensity::Bright => base + 60,
            };
            push_num(out, offset + index);
        }
        Some(Color::Rgb(r, g, b)) => {
            push_num(out, base + 8);
            for channel in [2, u16::from(r), u16::from(g), u16::from(b)] {
                out.push(b';');
                push_num(out, channel);
            }
        }
    }
}

/// A terminal control command.
///
/// Cursor rows and columns are 1-based ([`crate::geometry::Position`]
/// convention). Counts default to 1 and are elided from the encoding when
/// equal to their default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlSequence {
    CursorUp(u16),
    CursorDown(u16),
    CursorForward(u16),
    CursorBackward(u16),
    /// Move down `n` lines to column 1.
    CursorNextLine(u16),
    /// Move up `n` lines to column 1.
    CursorPreviousLine(u16),
    /// Move to an absolute column on the current row.
    CursorHorizontalAbsolute(u16),
    /// Move to an absolute (row, column).
    CursorPosition { row: u16, column: u16 },
    ErasePage(EraseExtent),
    EraseLine(EraseExtent),
    EraseField(EraseExtent),
    EraseArea(EraseExtent),
    ScrollUp(u16),
    ScrollDown(u16),
    /// Repeat the preceding graphic character `n` times.
    Repeat(u16),
    SelectGraphicRendition(Vec<GraphicRendition>),
    SetMode(Mode),
    ResetMode(Mode),
    /// DECFRA: fill the rectangle `top..=bottom` × `left..=right` with a
    /// character. The character must be printable (see [`crate::encode`]).
    FillRectangularArea {
        character: char,
        top: u16,
        left: u16,
        bottom: u16,
        right: u16,
    },
    /// Device attributes. Only [`DeviceAttributes::Request`] is a valid
    /// output; the response payloads are produced by the input parser.
    DeviceAttributes(DeviceAttributes),
    /// CPR: a terminal *response*, never valid output.
    CursorPositionReport { row: u16, column: u16 },
}

impl ControlSequence {
    /// Whether this variant is a terminal response rather than a command.
    ///
    /// Response-shaped sequences are a programming error to encode.
    #[inline]
    pub fn is_response(&self) -> bool {
        match self {
            Self::CursorPositionReport { .. } => true,
            Self::DeviceAttributes(da) => !matches!(da, DeviceAttributes::Request),
            _ => false,
        }
    }
}
