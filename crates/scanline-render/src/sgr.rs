#![forbid(unsafe_code)]

//! Graphic-rendition state tracking.
//!
//! The tracker remembers what the terminal is currently displaying and
//! turns a target [`Style`] into the minimum rendition list that gets
//! there. Each buffered output scope owns exactly one tracker; the type
//! is deliberately not `Clone`, because a copied tracker would desynchronise
//! from the terminal it models.
//!
//! Every attribute in this dialect has an individual off-code (22/23/24/
//! 25/29), so nothing is irreversibly sticky; a `Reset`-prefixed re-apply
//! is still used when it encodes no longer than the individual off-codes.

use scanline_core::control::{ControlSequence, GraphicRendition};
use scanline_core::encode::Encoding;
use scanline_core::style::{Attributes, Style};

/// Tracks the terminal's current graphic rendition.
#[derive(Debug)]
pub struct SgrTracker {
    current: Style,
}

impl SgrTracker {
    /// A tracker for a terminal in the default rendition.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Style::DEFAULT,
        }
    }

    /// The style the terminal is assumed to display right now.
    #[inline]
    pub fn current(&self) -> Style {
        self.current
    }

    /// Produce the minimal rendition list moving the terminal from the
    /// current style to `target`, and update the tracked state.
    ///
    /// Returns an empty list when no transition is needed; calling twice
    /// with the same target returns nothing the second time.
    pub fn transition(&mut self, target: Style) -> Vec<GraphicRendition> {
        if self.current == target {
            return Vec::new();
        }

        let delta = delta_renditions(self.current, target);
        let removed = self.current.attributes() & !target.attributes();

        let renditions = if removed.is_empty() {
            delta
        } else {
            // Removing attributes: a reset-prefixed re-apply can be
            // shorter than individual off-codes. Compare encoded lengths.
            let reset = reset_renditions(target);
            if sgr_len(&reset) < sgr_len(&delta) {
                reset
            } else {
                delta
            }
        };

        self.current = target;
        renditions
    }

    /// Forget the tracked state, treating the terminal as freshly reset.
    pub fn reset(&mut self) {
        self.current = Style::DEFAULT;
    }
}

impl Default for SgrTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// The incremental transition: changed colors, then attribute toggles.
fn delta_renditions(current: Style, target: Style) -> Vec<GraphicRendition> {
    let mut out = Vec::new();

    if current.foreground() != target.foreground() {
        out.push(GraphicRendition::Foreground(target.foreground()));
    }
    if current.background() != target.background() {
        out.push(GraphicRendition::Background(target.background()));
    }

    let toggled = current.attributes() ^ target.attributes();
    push_attribute_toggles(&mut out, toggled, target.attributes());

    out
}

/// The from-scratch transition: reset, then every set property.
fn reset_renditions(target: Style) -> Vec<GraphicRendition> {
    let mut out = vec![GraphicRendition::Reset];

    if target.foreground().is_some() {
        out.push(GraphicRendition::Foreground(target.foreground()));
    }
    if target.background().is_some() {
        out.push(GraphicRendition::Background(target.background()));
    }
    push_attribute_toggles(&mut out, target.attributes(), target.attributes());

    out
}

fn push_attribute_toggles(out: &mut Vec<GraphicRendition>, toggled: Attributes, now: Attributes) {
    use GraphicRendition as G;
    for (flag, on, off) in [
        (Attributes::BOLD, G::Bold, G::NormalIntensity),
        (Attributes::ITALIC, G::Italic, G::ItalicOff),
        (Attributes::UNDERLINE, G::Underline, G::UnderlineOff),
        (Attributes::BLINK, G::Blink, G::BlinkOff),
        (
            Attributes::STRIKETHROUGH,
            G::Strikethrough,
            G::StrikethroughOff,
        ),
    ] {
        if toggled.contains(flag) {
            out.push(if now.contains(flag) { on } else { off });
        }
    }
}

/// Encoded length of the rendition list as one SGR sequence.
fn sgr_len(renditions: &[GraphicRendition]) -> usize {
    Encoding::SevenBit.encoded_len(&ControlSequence::SelectGraphicRendition(
        renditions.to_vec(),
    ))
}
