#![forbid(unsafe_code)]

//! Input parser state machine.
//!
//! Decodes terminal byte streams into [`Event`]s. The parser is push-driven
//! and incremental: feed it arbitrary chunks with [`InputParser::parse`] and
//! it produces zero or more events per chunk, carrying any mid-sequence
//! state over to the next call. Splitting a well-formed sequence at any
//! byte boundary yields the same events as feeding it whole.
//!
//! # States
//!
//! `Ground → Escape → { Csi | Ss3 | Osc | Dcs }`, plus a UTF-8 collection
//! state for multi-byte scalars in Ground.
//!
//! # Error recovery
//!
//! A failed parse consumes exactly one byte and returns to Ground, so the
//! parser makes forward progress on arbitrary garbage. Oversized CSI/OSC
//! payloads are discarded to their terminator (DoS bound).

use crate::capabilities::DeviceAttributes;
use crate::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crate::geometry::Point;

/// DoS bound: longest accepted CSI sequence.
const MAX_CSI_LEN: usize = 256;

/// DoS bound: longest accepted OSC/DCS payload.
const MAX_STRING_LEN: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ParserState {
    /// Normal character input.
    #[default]
    Ground,
    /// After ESC.
    Escape,
    /// Collecting CSI parameters and intermediates.
    Csi,
    /// Discarding an oversized CSI sequence.
    CsiIgnore,
    /// After ESC O.
    Ss3,
    /// Collecting an OSC payload.
    Osc,
    /// After ESC inside OSC (potential `ESC \` terminator).
    OscEscape,
    /// Collecting a DCS payload.
    Dcs,
    /// After ESC inside DCS.
    DcsEscape,
    /// Collecting a UTF-8 multi-byte scalar.
    Utf8 { collected: u8, expected: u8 },
}

/// Terminal input parser.
///
/// ```
/// use scanline_core::input_parser::InputParser;
///
/// let mut parser = InputParser::new();
/// let events = parser.parse(b"\x1b[A"); // cursor up
/// assert_eq!(events.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InputParser {
    state: ParserState,
    /// Private-prefix byte (`<`, `=`, `>`, `?`), captured before params.
    private: Option<u8>,
    /// Intermediate bytes (0x20..=0x2F).
    intermediates: Vec<u8>,
    /// Completed numeric parameters.
    params: Vec<u16>,
    /// Parameter currently being accumulated.
    current_param: Option<u16>,
    /// Total bytes of the CSI sequence so far (DoS accounting).
    csi_len: usize,
    /// OSC/DCS payload length so far (content is discarded).
    string_len: usize,
    /// UTF-8 bytes collected so far.
    utf8_buf: [u8; 4],
}

impl InputParser {
    /// Create a parser in the Ground state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a chunk of input bytes, returning the completed events.
    ///
    /// Incomplete sequences stay buffered in the parser; the next call
    /// resumes where this one left off.
    pub fn parse(&mut self, input: &[u8]) -> Vec<Event> {
        let mut events = Vec::new();
        for &byte in input {
            self.process_byte(byte, &mut events);
        }
        events
    }

    /// Signal end of the input stream.
    ///
    /// A pending lone ESC becomes a literal Escape key event; any other
    /// mid-sequence state is dropped.
    pub fn finish(&mut self) -> Option<Event> {
        let pending = matches!(self.state, ParserState::Escape);
        self.reset_sequence();
        self.state = ParserState::Ground;
        pending.then(|| Event::Key(KeyEvent::new(KeyCode::Escape)))
    }

    fn reset_sequence(&mut self) {
        self.private = None;
        self.intermediates.clear();
        self.params.clear();
        self.current_param = None;
        self.csi_len = 0;
        self.string_len = 0;
    }

    fn process_byte(&mut self, byte: u8, events: &mut Vec<Event>) {
        match self.state {
            ParserState::Ground => self.process_ground(byte, events),
            ParserState::Escape => self.process_escape(byte, events),
            ParserState::Csi => self.process_csi(byte, events),
            ParserState::CsiIgnore => self.process_csi_ignore(byte),
            ParserState::Ss3 => self.process_ss3(byte, events),
            ParserState::Osc => self.process_string(byte, true),
            ParserState::OscEscape => self.process_string_escape(byte, true),
            ParserState::Dcs => self.process_string(byte, false),
            ParserState::DcsEscape => self.process_string_escape(byte, false),
            ParserState::Utf8 {
                collected,
                expected,
            } => self.process_utf8(byte, collected, expected, events),
        }
    }

    // ── Ground ───────────────────────────────────────────────────────────

    fn process_ground(&mut self, byte: u8, events: &mut Vec<Event>) {
        let key = |code| Event::Key(KeyEvent::new(code));
        match byte {
            0x1B => self.state = ParserState::Escape,
            0x00 => events.push(key(KeyCode::Null)),
            0x08 | 0x7F => events.push(key(KeyCode::Backspace)),
            0x09 => events.push(key(KeyCode::Tab)),
            0x0D => events.push(key(KeyCode::Enter)),
            // Remaining C0 controls arrive as Ctrl+letter.
            0x01..=0x07 | 0x0A..=0x0C | 0x0E..=0x1A => {
                let c = (byte + b'a' - 1) as char;
                events.push(Event::Key(
                    KeyEvent::new(KeyCode::Char(c)).with_modifiers(Modifiers::CTRL),
                ));
            }
            0x20..=0x7E => events.push(key(KeyCode::Char(byte as char))),
            // UTF-8 lead bytes.
            0xC0..=0xDF => self.begin_utf8(byte, 2),
            0xE0..=0xEF => self.begin_utf8(byte, 3),
            0xF0..=0xF7 => self.begin_utf8(byte, 4),
            // Stray continuation or invalid byte: consumed, no event.
            _ => {}
        }
    }

    fn begin_utf8(&mut self, lead: u8, expected: u8) {
        self.utf8_buf[0] = lead;
        self.state = ParserState::Utf8 {
            collected: 1,
            expected,
        };
    }

    fn process_utf8(&mut self, byte: u8, collected: u8, expected: u8, events: &mut Vec<Event>) {
        if !(0x80..=0xBF).contains(&byte) {
            // The lead byte was the failed parse; reprocess this byte fresh.
            self.state = ParserState::Ground;
            self.process_byte(byte, events);
            return;
        }

        self.utf8_buf[collected as usize] = byte;
        let collected = collected + 1;
        if collected < expected {
            self.state = ParserState::Utf8 {
                collected,
                expected,
            };
            return;
        }

        self.state = ParserState::Ground;
        if let Ok(s) = core::str::from_utf8(&self.utf8_buf[..expected as usize])
            && let Some(c) = s.chars().next()
        {
            events.push(Event::Key(KeyEvent::new(KeyCode::Char(c))));
        }
        // Overlong or invalid scalar: dropped.
    }

    // ── Escape ───────────────────────────────────────────────────────────

    fn process_escape(&mut self, byte: u8, events: &mut Vec<Event>) {
        match byte {
            b'[' => {
                self.reset_sequence();
                self.state = ParserState::Csi;
            }
            b'O' => self.state = ParserState::Ss3,
            b']' => {
                self.string_len = 0;
                self.state = ParserState::Osc;
            }
            b'P' => {
                self.string_len = 0;
                self.state = ParserState::Dcs;
            }
            0x1B => {
                self.state = ParserState::Ground;
                events.push(Event::Key(
                    KeyEvent::new(KeyCode::Escape).with_modifiers(Modifiers::ALT),
                ));
            }
            // ESC + printable is how most terminals report Alt+key.
            0x20..=0x7E => {
                self.state = ParserState::Ground;
                events.push(Event::Key(
                    KeyEvent::new(KeyCode::Char(byte as char)).with_modifiers(Modifiers::ALT),
                ));
            }
            _ => self.state = ParserState::Ground,
        }
    }

    // ── CSI ──────────────────────────────────────────────────────────────

    fn process_csi(&mut self, byte: u8, events: &mut Vec<Event>) {
        // ESC restarts the sequence rather than corrupting it.
        if byte == 0x1B {
            self.reset_sequence();
            self.state = ParserState::Escape;
            return;
        }

        self.csi_len += 1;
        if self.csi_len > MAX_CSI_LEN {
            self.reset_sequence();
            self.state = ParserState::CsiIgnore;
            return;
        }

        match byte {
            b'0'..=b'9' => {
                let digit = u16::from(byte - b'0');
                let param = self.current_param.unwrap_or(0);
                self.current_param = Some(param.saturating_mul(10).saturating_add(digit));
            }
            // `;` ends a parameter; `:` separates sub-parameters, which we
            // flatten into the same list (the dispatchers index positionally).
            b';' | b':' => {
                let param = self.current_param.take().unwrap_or(0);
                self.params.push(param);
            }
            // Private markers are only valid before any parameter digits.
            0x3C..=0x3F => {
                if self.params.is_empty() && self.current_param.is_none() && self.private.is_none()
                {
                    self.private = Some(byte);
                } else {
                    self.reset_sequence();
                    self.state = ParserState::Ground;
                }
            }
            0x20..=0x2F => self.intermediates.push(byte),
            0x40..=0x7E => {
                if let Some(param) = self.current_param.take() {
                    self.params.push(param);
                }
                self.state = ParserState::Ground;
                if let Some(event) = self.dispatch_csi(byte) {
                    events.push(event);
                }
                self.reset_sequence();
            }
            _ => {
                self.reset_sequence();
                self.state = ParserState::Ground;
            }
        }
    }

    fn process_csi_ignore(&mut self, byte: u8) {
        if byte == 0x1B {
            self.state = ParserState::Escape;
        } else if (0x40..=0x7E).contains(&byte) {
            self.state = ParserState::Ground;
        }
    }

    /// Nth parameter with a default.
    fn param(&self, index: usize, default: u16) -> u16 {
        match self.params.get(index) {
            Some(&0) | None => default,
            Some(&value) => value,
        }
    }

    /// Decode the xterm modifier parameter: `value = 1 + bits`.
    fn modifiers(&self, index: usize) -> Modifiers {
        let bits = self.param(index, 1).saturating_sub(1);
        let mut mods = Modifiers::empty();
        if bits & 1 != 0 {
            mods |= Modifiers::SHIFT;
        }
        if bits & 2 != 0 {
            mods |= Modifiers::ALT;
        }
        if bits & 4 != 0 {
            mods |= Modifiers::CTRL;
        }
        if bits & 8 != 0 {
            mods |= Modifiers::SUPER;
        }
        mods
    }

    /// Event-type sub-parameter (kitty protocol): 3 means release.
    fn event_kind(&self, index: usize) -> KeyEventKind {
        if self.params.get(index) == Some(&3) {
            KeyEventKind::Release
        } else {
            KeyEventKind::Press
        }
    }

    fn modified_key(&self, code: KeyCode) -> Event {
        Event::Key(
            KeyEvent::new(code)
                .with_modifiers(self.modifiers(1))
                .with_kind(self.event_kind(2)),
        )
    }

    fn dispatch_csi(&mut self, final_byte: u8) -> Option<Event> {
        match (self.private, final_byte) {
            // Device-attribute responses, parameter lists preserved.
            (Some(b'?'), b'c') => Some(Event::Response(DeviceAttributes::Primary(
                core::mem::take(&mut self.params),
            ))),
            (Some(b'>'), b'c') => Some(Event::Response(DeviceAttributes::Secondary(
                core::mem::take(&mut self.params),
            ))),
            (Some(b'='), b'c') => Some(Event::Response(DeviceAttributes::Tertiary(
                core::mem::take(&mut self.params),
            ))),

            // SGR mouse protocol.
            (Some(b'<'), b'M') => self.decode_sgr_mouse(true),
            (Some(b'<'), b'm') => self.decode_sgr_mouse(false),

            (None, b'A') => Some(self.modified_key(KeyCode::Up)),
            (None, b'B') => Some(self.modified_key(KeyCode::Down)),
            (None, b'C') => Some(self.modified_key(KeyCode::Right)),
            (None, b'D') => Some(self.modified_key(KeyCode::Left)),
            (None, b'H') => Some(self.modified_key(KeyCode::Home)),
            (None, b'F') => Some(self.modified_key(KeyCode::End)),
            (None, b'Z') => Some(self.modified_key(KeyCode::BackTab)),

            // xterm sends F1–F4 as `CSI 1 ; mods P..S` when modified.
            (None, b'P') => Some(self.modified_key(KeyCode::F(1))),
            (None, b'Q') => Some(self.modified_key(KeyCode::F(2))),
            (None, b'R') => Some(self.modified_key(KeyCode::F(3))),
            (None, b'S') => Some(self.modified_key(KeyCode::F(4))),

            (None, b'~') => self.dispatch_tilde(),

            // Everything else is dropped, never surfaced.
            _ => None,
        }
    }

    fn dispatch_tilde(&self) -> Option<Event> {
        let code = match self.param(0, 1) {
            1 => KeyCode::Home,
            2 => KeyCode::Insert,
            3 => KeyCode::Delete,
            4 => KeyCode::End,
            5 => KeyCode::PageUp,
            6 => KeyCode::PageDown,
            15 => KeyCode::F(5),
            17 => KeyCode::F(6),
            18 => KeyCode::F(7),
            19 => KeyCode::F(8),
            20 => KeyCode::F(9),
            21 => KeyCode::F(10),
            23 => KeyCode::F(11),
            24 => KeyCode::F(12),
            _ => return None,
        };
        Some(self.modified_key(code))
    }

    fn decode_sgr_mouse(&self, press: bool) -> Option<Event> {
        if self.params.len() < 3 {
            return None;
        }
        let code = self.params[0];
        let point = Point::new(
            self.params[1].saturating_sub(1),
            self.params[2].saturating_sub(1),
        );

        let button = match code & 0b11 {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            _ => MouseButton::Right,
        };

        let kind = if code & 64 != 0 {
            if code & 1 == 0 {
                MouseEventKind::ScrollUp
            } else {
                MouseEventKind::ScrollDown
            }
        } else if code & 32 != 0 {
            if code & 0b11 == 0b11 {
                MouseEventKind::Moved
            } else {
                MouseEventKind::Dragged(button)
            }
        } else if press {
            MouseEventKind::Pressed(button)
        } else {
            MouseEventKind::Released(button)
        };

        let mut mods = Modifiers::empty();
        if code & 4 != 0 {
            mods |= Modifiers::SHIFT;
        }
        if code & 8 != 0 {
            mods |= Modifiers::ALT;
        }
        if code & 16 != 0 {
            mods |= Modifiers::CTRL;
        }

        Some(Event::Mouse(MouseEvent::new(kind, point).with_modifiers(mods)))
    }

    // ── SS3 ──────────────────────────────────────────────────────────────

    fn process_ss3(&mut self, byte: u8, events: &mut Vec<Event>) {
        if byte == 0x1B {
            self.state = ParserState::Escape;
            return;
        }

        self.state = ParserState::Ground;
        let code = match byte {
            b'A' => KeyCode::Up,
            b'B' => KeyCode::Down,
            b'C' => KeyCode::Right,
            b'D' => KeyCode::Left,
            b'P' => KeyCode::F(1),
            b'Q' => KeyCode::F(2),
            b'R' => KeyCode::F(3),
            b'S' => KeyCode::F(4),
            b'H' => KeyCode::Home,
            b'F' => KeyCode::End,
            _ => return,
        };
        events.push(Event::Key(KeyEvent::new(code)));
    }

    // ── OSC / DCS ────────────────────────────────────────────────────────

    // Payloads are length-bounded and discarded: the engine recognises no
    // OSC or DCS responses, but must still skip them losslessly.

    fn process_string(&mut self, byte: u8, osc: bool) {
        if byte == 0x1B {
            self.state = if osc {
                ParserState::OscEscape
            } else {
                ParserState::DcsEscape
            };
            return;
        }
        // BEL terminates OSC only.
        if osc && byte == 0x07 {
            self.string_len = 0;
            self.state = ParserState::Ground;
            return;
        }
        self.string_len += 1;
        if self.string_len > MAX_STRING_LEN {
            self.string_len = 0;
            self.state = ParserState::Ground;
        }
    }

    fn process_string_escape(&mut self, byte: u8, osc: bool) {
        match byte {
            b'\\' => {
                self.string_len = 0;
                self.state = ParserState::Ground;
            }
            0x1B => {}
            _ => {
                self.state = if osc { ParserState::Osc } else { ParserState::Dcs };
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The parser never panics and always terminates on arbitrary input.
        #[test]
        fn total_on_arbitrary_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut parser = InputParser::new();
            let _ = parser.parse(&bytes);
            let _ = parser.finish();
        }

        /// Chunk boundaries never change the decoded event stream.
        #[test]
        fn chunking_invariance(
            bytes in proptest::collection::vec(any::<u8>(), 0..128),
            split in any::<usize>(),
        ) {
            let whole = InputParser::new().parse(&bytes);

            let split = if bytes.is_empty() { 0 } else { split % bytes.len() };
            let mut parser = InputParser::new();
            let mut chunked = parser.parse(&bytes[..split]);
            chunked.extend(parser.parse(&bytes[split..]));

            prop_assert_eq!(whole, chunked);
        }
    }
}
