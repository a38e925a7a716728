#![forbid(unsafe_code)]

//! Graphic-rendition style, packed into 64 bits.
//!
//! # Layout (8 bytes, non-negotiable)
//!
//! ```text
//! [63..40 background (24)][39..16 foreground (24)][15..8 attrs (8)][7..0 presence (8)]
//! ```
//!
//! Each 24-bit color field holds either an RGB triple (`r<<16 | g<<8 | b`)
//! or an ANSI palette entry (`name | bright<<4`); the presence byte says
//! which interpretation applies and whether the color is set at all.
//!
//! Two styles compare equal iff their packings are equal. This is the
//! invariant the damage detector and the SGR tracker rely on, so equality
//! is derived straight from the `u64`.

use bitflags::bitflags;

/// Named ANSI palette colors.
///
/// `Default` selects the terminal's configured default color (SGR 39/49)
/// rather than a palette slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnsiColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Default,
}

impl AnsiColor {
    /// Palette index used in SGR codes (30 + index). `Default` has none.
    #[inline]
    pub const fn index(self) -> Option<u8> {
        match self {
            Self::Black => Some(0),
            Self::Red => Some(1),
            Self::Green => Some(2),
            Self::Yellow => Some(3),
            Self::Blue => Some(4),
            Self::Magenta => Some(5),
            Self::Cyan => Some(6),
            Self::White => Some(7),
            Self::Default => None,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Black,
            1 => Self::Red,
            2 => Self::Green,
            3 => Self::Yellow,
            4 => Self::Blue,
            5 => Self::Magenta,
            6 => Self::Cyan,
            7 => Self::White,
            _ => Self::Default,
        }
    }

    const fn raw(self) -> u8 {
        match self {
            Self::Black => 0,
            Self::Red => 1,
            Self::Green => 2,
            Self::Yellow => 3,
            Self::Blue => 4,
            Self::Magenta => 5,
            Self::Cyan => 6,
            Self::White => 7,
            Self::Default => 8,
        }
    }
}

/// ANSI color intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Intensity {
    #[default]
    Normal,
    /// Bright variant (SGR 90–97 / 100–107).
    Bright,
}

/// A terminal color: a named palette entry or a 24-bit RGB triple.
///
/// "No color" is represented as `Option<Color>::None` at the API surface
/// and as a cleared presence bit in the packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Ansi(AnsiColor, Intensity),
    Rgb(u8, u8, u8),
}

impl Color {
    /// Shorthand for a normal-intensity palette color.
    #[inline]
    pub const fn ansi(name: AnsiColor) -> Self {
        Self::Ansi(name, Intensity::Normal)
    }

    /// Shorthand for a bright palette color.
    #[inline]
    pub const fn bright(name: AnsiColor) -> Self {
        Self::Ansi(name, Intensity::Bright)
    }

    /// Pack into a 24-bit field. The RGB flag is returned separately.
    const fn pack(self) -> (u32, bool) {
        match self {
            Self::Ansi(name, intensity) => {
                let bright = matches!(intensity, Intensity::Bright) as u32;
                ((name.raw() as u32) | (bright << 4), false)
            }
            Self::Rgb(r, g, b) => (((r as u32) << 16) | ((g as u32) << 8) | b as u32, true),
        }
    }

    const fn unpack(field: u32, rgb: bool) -> Self {
        if rgb {
            Self::Rgb((field >> 16) as u8, (field >> 8) as u8, field as u8)
        } else {
            let intensity = if field & 0x10 != 0 {
                Intensity::Bright
            } else {
                Intensity::Normal
            };
            Self::Ansi(AnsiColor::from_raw((field & 0x0F) as u8), intensity)
        }
    }
}

bitflags! {
    /// Graphic-rendition attribute bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attributes: u8 {
        const BOLD          = 0b0000_0001;
        const ITALIC        = 0b0000_0010;
        const UNDERLINE     = 0b0000_0100;
        const BLINK         = 0b0000_1000;
        const STRIKETHROUGH = 0b0001_0000;
    }
}

// Presence flags (bits 7..0 of the packing).
const FG_SET: u64 = 1 << 0;
const FG_RGB: u64 = 1 << 1;
const BG_SET: u64 = 1 << 2;
const BG_RGB: u64 = 1 << 3;

const ATTR_SHIFT: u32 = 8;
const FG_SHIFT: u32 = 16;
const BG_SHIFT: u32 = 40;
const COLOR_MASK: u64 = 0x00FF_FFFF;

/// A packed cell style: foreground, background, and attributes in 8 bytes.
///
/// The default style (no colors, no attributes) packs to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Style(u64);

// Compile-time size check: a cell must stay (char, style) = 16 bytes.
const _: () = assert!(core::mem::size_of::<Style>() == 8);

impl Style {
    /// The default style: terminal default colors, no attributes.
    pub const DEFAULT: Self = Self(0);

    /// Create the default style.
    #[inline]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Raw packed value.
    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Foreground color, if set.
    #[inline]
    pub const fn foreground(self) -> Option<Color> {
        if self.0 & FG_SET == 0 {
            None
        } else {
            Some(Color::unpack(
                ((self.0 >> FG_SHIFT) & COLOR_MASK) as u32,
                self.0 & FG_RGB != 0,
            ))
        }
    }

    /// Background color, if set.
    #[inline]
    pub const fn background(self) -> Option<Color> {
        if self.0 & BG_SET == 0 {
            None
        } else {
            Some(Color::unpack(
                ((self.0 >> BG_SHIFT) & COLOR_MASK) as u32,
                self.0 & BG_RGB != 0,
            ))
        }
    }

    /// Attribute bits.
    #[inline]
    pub const fn attributes(self) -> Attributes {
        Attributes::from_bits_truncate((self.0 >> ATTR_SHIFT) as u8)
    }

    /// Return a copy with the given foreground.
    #[must_use]
    pub const fn with_foreground(self, color: Option<Color>) -> Self {
        let cleared = self.0 & !(COLOR_MASK << FG_SHIFT) & !(FG_SET | FG_RGB);
        match color {
            None => Self(cleared),
            Some(c) => {
                let (field, rgb) = c.pack();
                let flags = FG_SET | if rgb { FG_RGB } else { 0 };
                Self(cleared | ((field as u64) << FG_SHIFT) | flags)
            }
        }
    }

    /// Return a copy with the given background.
    #[must_use]
    pub const fn with_background(self, color: Option<Color>) -> Self {
        let cleared = self.0 & !(COLOR_MASK << BG_SHIFT) & !(BG_SET | BG_RGB);
        match color {
            None => Self(cleared),
            Some(c) => {
                let (field, rgb) = c.pack();
                let flags = BG_SET | if rgb { BG_RGB } else { 0 };
                Self(cleared | ((field as u64) << BG_SHIFT) | flags)
            }
        }
    }

    /// Return a copy with the given attribute set.
    #[must_use]
    pub const fn with_attributes(self, attrs: Attributes) -> Self {
        Self((self.0 & !(0xFF << ATTR_SHIFT)) | ((attrs.bits() as u64) << ATTR_SHIFT))
    }

    /// Return a copy with one attribute added.
    #[must_use]
    pub const fn with_attribute(self, attr: Attributes) -> Self {
        Self(self.0 | ((attr.bits() as u64) << ATTR_SHIFT))
    }

    /// Whether this is the default style.
    #[inline]
    pub const fn is_default(self) -> bool {
        self.0 == 0
    }
}


#[cfg(test)]
mod proptests {
    use super::{AnsiColor, Attributes, Color, Intensity, Style};
    use proptest::prelude::*;

    fn arb_color() -> impl Strategy<Value = Color> {
        prop_oneof![
            (0u8..=8, any::<bool>()).prop_map(|(n, bright)| {
                let name = match n {
                    0 => AnsiColor::Black,
                    1 => AnsiColor::Red,
                    2 => AnsiColor::Green,
                    3 => AnsiColor::Yellow,
                    4 => AnsiColor::Blue,
                    5 => AnsiColor::Magenta,
                    6 => AnsiColor::Cyan,
                    7 => AnsiColor::White,
                    _ => AnsiColor::Default,
                };
                let intensity = if bright {
                    Intensity::Bright
                } else {
                    Intensity::Normal
                };
                Color::Ansi(name, intensity)
            }),
            (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(r, g, b)| Color::Rgb(r, g, b)),
        ]
    }

    proptest! {
        #[test]
        fn pack_unpack_round_trips(
            fg in proptest::option::of(arb_color()),
            bg in proptest::option::of(arb_color()),
            attrs in any::<u8>(),
        ) {
            let attrs = Attributes::from_bits_truncate(attrs);
            let s = Style::new()
                .with_foreground(fg)
                .with_background(bg)
                .with_attributes(attrs);
            prop_assert_eq!(s.foreground(), fg);
            prop_assert_eq!(s.background(), bg);
            prop_assert_eq!(s.attributes(), attrs);
        }

        #[test]
        fn rebuilding_preserves_packing(
            fg in proptest::option::of(arb_color()),
            bg in proptest::option::of(arb_color()),
            attrs in any::<u8>(),
        ) {
            let attrs = Attributes::from_bits_truncate(attrs);
            let s = Style::new()
                .with_foreground(fg)
                .with_background(bg)
                .with_attributes(attrs);
            let rebuilt = Style::new()
                .with_attributes(s.attributes())
                .with_background(s.background())
                .with_foreground(s.foreground());
            prop_assert_eq!(s.bits(), rebuilt.bits());
        }
    }
}
