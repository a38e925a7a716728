#![forbid(unsafe_code)]

//! Canonical input events.
//!
//! Everything the engine delivers to an application flows through one
//! closed sum type: keys, mouse, resize, and terminal responses. Mouse
//! points are 0-indexed; the wire protocol's 1-based coordinates are
//! converted at the parser boundary.

use bitflags::bitflags;

use crate::capabilities::DeviceAttributes;
use crate::geometry::{Point, Size};

/// An input event delivered to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// The terminal was resized. The caller redraws; there is no reflow.
    Resize(Size),
    /// A device-attributes response arrived.
    Response(DeviceAttributes),
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A plain key press without modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }

    /// Builder: set modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Builder: set the press/release kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check for a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }
}

/// Key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key (including control characters delivered verbatim).
    Char(char),
    Escape,
    Enter,
    Tab,
    BackTab,
    Backspace,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    /// Function key F1–F12.
    F(u8),
    /// NUL (Ctrl+Space / Ctrl+@).
    Null,
}

/// Whether the key went down or up.
///
/// Most terminals only report presses; `Release` appears when the terminal
/// supports an event-type-reporting protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Release,
}

bitflags! {
    /// Modifier keys held during an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

/// A mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    /// 0-indexed cell the event happened in.
    pub point: Point,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Create a mouse event without modifiers.
    #[must_use]
    pub const fn new(kind: MouseEventKind, point: Point) -> Self {
        Self {
            kind,
            point,
            modifiers: Modifiers::empty(),
        }
    }

    /// Builder: set modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// The kind of mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Pressed(MouseButton),
    Released(MouseButton),
    /// Motion with no button held.
    Moved,
    /// Motion while a button is held.
    Dragged(MouseButton),
    ScrollUp,
    ScrollDown,
}

/// Mouse button identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}
