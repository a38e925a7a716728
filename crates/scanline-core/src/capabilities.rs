#![forbid(unsafe_code)]

//! Device-attribute responses and the capability model derived from them.
//!
//! The engine identifies the terminal with a primary Device Attributes
//! query (`CSI c`). Two response shapes exist in the wild:
//!
//! - VT100-style: `CSI ? Pt ; Ps c`, a terminal *type* plus a service
//!   class (e.g. `?1;2c` = VT100 with advanced video).
//! - VT220 and later: `CSI ? Pf ; F1 ; F2 ; ... c`, an architectural
//!   *family* level (61 + n) plus a feature-code list (e.g. `?62;22c` =
//!   level-2 terminal with ANSI color).
//!
//! A query that times out resolves to "unknown", the most conservative
//! identity, `Specific(Vt101, Base)`. Unrecognised responses degrade the
//! same way (fail-open).

use bitflags::bitflags;

/// Payload of a Device Attributes exchange.
///
/// `Request` is the only encodable variant; the three response shapes are
/// produced by the input parser from `CSI ? … c`, `CSI > … c`, and
/// `CSI = … c`, with the parameter list preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAttributes {
    /// DA1 request (`CSI c`).
    Request,
    /// Primary response (`CSI ? … c`).
    Primary(Vec<u16>),
    /// Secondary response (`CSI > … c`).
    Secondary(Vec<u16>),
    /// Tertiary response (`CSI = … c`).
    Tertiary(Vec<u16>),
}

/// Concrete VT100-series terminal types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Vt100,
    Vt101,
    Vt102,
    Vt125,
    Vt131,
    Vt132,
}

/// Service classes reported by VT100-style responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceClass {
    /// No options.
    #[default]
    Base,
    /// Advanced video option (AVO).
    AdvancedVideo,
    /// AVO plus graphics processor.
    AdvancedVideoGraphics,
}

/// Architectural family level of VT220-and-later responses (`6x` ⇒ level x).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalFamily(pub u16);

impl TerminalFamily {
    /// Conformance level (1 for a 61 response, 2 for 62, …).
    #[inline]
    pub const fn level(self) -> u16 {
        self.0
    }
}

bitflags! {
    /// Feature codes advertised in a VT220+ primary response.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Features: u32 {
        const COLUMNS_132       = 1 << 0;
        const PRINTER_PORT      = 1 << 1;
        const REGIS_GRAPHICS    = 1 << 2;
        const SIXEL_GRAPHICS    = 1 << 3;
        const SELECTIVE_ERASE   = 1 << 4;
        const USER_DEFINED_KEYS = 1 << 5;
        const NATIONAL_CHARSETS = 1 << 6;
        const TECHNICAL_CHARSET = 1 << 7;
        const USER_WINDOWS      = 1 << 8;
        const HORIZONTAL_SCROLL = 1 << 9;
        const ANSI_COLOR        = 1 << 10;
        const ANSI_TEXT_LOCATOR = 1 << 11;
    }
}

impl Features {
    /// Map one DA1 feature code to its flag, if known.
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::COLUMNS_132),
            2 => Some(Self::PRINTER_PORT),
            3 => Some(Self::REGIS_GRAPHICS),
            4 => Some(Self::SIXEL_GRAPHICS),
            6 => Some(Self::SELECTIVE_ERASE),
            8 => Some(Self::USER_DEFINED_KEYS),
            9 => Some(Self::NATIONAL_CHARSETS),
            15 => Some(Self::TECHNICAL_CHARSET),
            18 => Some(Self::USER_WINDOWS),
            21 => Some(Self::HORIZONTAL_SCROLL),
            22 => Some(Self::ANSI_COLOR),
            29 => Some(Self::ANSI_TEXT_LOCATOR),
            _ => None,
        }
    }
}

/// What the terminal told us it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalCapabilities {
    /// A concrete VT100-series terminal with a service class.
    Specific(TerminalKind, ServiceClass),
    /// A VT220-or-later family level with a feature set.
    Compatible(TerminalFamily, Features),
}

impl TerminalCapabilities {
    /// The fail-open identity used when a query times out or the response
    /// is unrecognisable.
    #[inline]
    pub const fn unknown() -> Self {
        Self::Specific(TerminalKind::Vt101, ServiceClass::Base)
    }

    /// Interpret a primary device-attributes parameter list.
    #[must_use]
    pub fn from_primary(params: &[u16]) -> Self {
        let Some(&first) = params.first() else {
            return Self::unknown();
        };

        if first >= 61 {
            let mut features = Features::empty();
            for &code in &params[1..] {
                if let Some(flag) = Features::from_code(code) {
                    features |= flag;
                }
            }
            return Self::Compatible(TerminalFamily(first - 60), features);
        }

        let service = match params.get(1).copied() {
            Some(2) => ServiceClass::AdvancedVideo,
            Some(6) => ServiceClass::AdvancedVideoGraphics,
            _ => ServiceClass::Base,
        };
        let kind = match first {
            1 => TerminalKind::Vt100,
            4 => TerminalKind::Vt132,
            6 => TerminalKind::Vt102,
            7 => TerminalKind::Vt131,
            12 => TerminalKind::Vt125,
            _ => return Self::unknown(),
        };
        Self::Specific(kind, service)
    }

    /// Whether the terminal advertises a feature (always false for the
    /// VT100-series shapes, which predate feature codes).
    #[must_use]
    pub fn has_feature(&self, feature: Features) -> bool {
        match self {
            Self::Specific(..) => false,
            Self::Compatible(_, features) => features.contains(feature),
        }
    }
}

impl Default for TerminalCapabilities {
    fn default() -> Self {
        Self::unknown()
    }
}
