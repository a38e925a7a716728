#![forbid(unsafe_code)]

//! The double-buffered renderer.
//!
//! Drawing targets the back buffer; [`Renderer::present`] diffs it against
//! the front buffer and emits the narrowest byte stream that reconciles
//! the terminal: damage spans, optimised cursor motions, minimal SGR
//! transitions, and run-length compressed content, all inside one
//! synchronized-update bracket. Then the buffers swap.
//!
//! Terminal-global state (raw discipline, alternate screen, cursor
//! visibility) is process-wide: it is entered in [`Renderer::new`] and
//! restored on `Drop`, on every exit path.
//!
//! The back buffer is *not* cleared by `present()`; the driver clears it
//! after each frame so the next frame draws on a known blank state.

use std::io;

use scanline_core::control::{ControlSequence, EraseExtent, GraphicRendition, Mode};
use scanline_core::device::{TerminalDevice, TerminalMode};
use scanline_core::encode::Encoding;
use scanline_core::geometry::{Position, Size};

use crate::buffer::Buffer;
use crate::damage::damage;
use crate::motion;
use crate::segment::{MIN_RUN, Segment, segment};
use crate::sgr::SgrTracker;
use crate::sink::FrameSink;

/// Renderer construction options.
#[derive(Debug, Clone, Copy)]
pub struct RendererOptions {
    /// Control-sequence encoding for the whole session.
    pub encoding: Encoding,
    /// Switch to the alternate screen buffer on entry.
    pub alternate_screen: bool,
    /// Hide the cursor while the renderer owns the screen.
    pub hide_cursor: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::SevenBit,
            alternate_screen: true,
            hide_cursor: true,
        }
    }
}

/// A double-buffered, damage-driven renderer over a terminal device.
pub struct Renderer<D: TerminalDevice> {
    device: D,
    options: RendererOptions,
    front: Buffer,
    back: Buffer,
}

impl<D: TerminalDevice> Renderer<D> {
    /// Enter terminal mode and allocate both buffers at the current size.
    ///
    /// # Errors
    ///
    /// Fails if the device cannot enter raw mode; nothing is left to
    /// restore in that case.
    pub fn new(mut device: D, options: RendererOptions) -> io::Result<Self> {
        device.enter(TerminalMode::Raw)?;

        let size = device.size();
        let mut renderer = Self {
            device,
            options,
            front: Buffer::new(size),
            back: Buffer::new(size),
        };

        if options.alternate_screen {
            renderer.write_sequence(&ControlSequence::SetMode(Mode::AlternateScreen));
            renderer.write_sequence(&ControlSequence::ErasePage(EraseExtent::All));
            renderer.write_sequence(&ControlSequence::CursorPosition { row: 1, column: 1 });
        }
        if options.hide_cursor {
            renderer.write_sequence(&ControlSequence::ResetMode(Mode::CursorVisible));
        }

        #[cfg(feature = "tracing")]
        tracing::info!(width = size.width, height = size.height, "renderer started");

        Ok(renderer)
    }

    /// Current buffer size.
    #[inline]
    pub fn size(&self) -> Size {
        self.front.size()
    }

    /// The session encoding.
    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.options.encoding
    }

    /// The drawing target for the next frame.
    #[inline]
    pub fn back(&mut self) -> &mut Buffer {
        &mut self.back
    }

    /// The most recently presented frame.
    #[inline]
    pub fn front(&self) -> &Buffer {
        &self.front
    }

    /// The underlying device.
    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The underlying device (input bytes are read from here).
    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Adopt a new terminal size. The back buffer is reallocated blank at
    /// the new size; the stale front buffer forces the next `present` to
    /// repaint everything (the caller redraws, there is no reflow).
    pub fn resize(&mut self, size: Size) {
        if size != self.back.size() {
            self.back = Buffer::new(size);
        }
    }

    /// Diff, emit, swap.
    pub fn present(&mut self) {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("present").entered();

        let spans = damage(&self.front, &self.back);
        if !spans.is_empty() {
            let size = self.back.size();
            let cells = self.back.cells();
            let mut sink = FrameSink::synchronized(&mut self.device, self.options.encoding);
            let mut cursor = Position::UNKNOWN;
            let mut tracker = SgrTracker::new();

            for span in &spans {
                let target = Position::from_offset(span.range.start, size);
                if target != cursor {
                    for command in motion::optimise(cursor, target, sink.encoding()) {
                        sink.sequence(&command);
                    }
                }

                let transition = tracker.transition(span.style);
                if !transition.is_empty() {
                    sink.sequence(&ControlSequence::SelectGraphicRendition(transition));
                }

                for piece in segment(&cells[span.range.clone()], MIN_RUN) {
                    match piece {
                        Segment::Run(ch, count) => {
                            sink.put_char(ch);
                            if count > 1 {
                                sink.sequence(&ControlSequence::Repeat((count - 1) as u16));
                            }
                        }
                        Segment::Literal(text) => sink.put_str(&text),
                    }
                }

                // Track where the terminal cursor ended up. Writing through
                // the rightmost column leaves the terminal in deferred-wrap
                // state: the cursor stays on that column until the next
                // glyph wraps it.
                let last = Position::from_offset(span.range.end - 1, size);
                cursor = if last.column >= size.width {
                    last
                } else {
                    last.with_column(last.column + 1)
                };
            }

            sink.sequence(&ControlSequence::SelectGraphicRendition(vec![
                GraphicRendition::Reset,
            ]));
            // Sink drop closes the synchronized bracket and flushes.
        }

        std::mem::swap(&mut self.front, &mut self.back);
        // After a resize the swapped-in back buffer has the stale size.
        if self.back.size() != self.front.size() {
            self.back = Buffer::new(self.front.size());
        }
    }

    /// Pass a control sequence straight to the device in the session
    /// encoding.
    pub fn write_sequence(&mut self, sequence: &ControlSequence) {
        let bytes = self.options.encoding.encode(sequence);
        self.device.write(&bytes);
    }

    /// Pass raw text straight to the device.
    pub fn write_str(&mut self, text: &str) {
        self.device.write(text.as_bytes());
    }
}

impl<D: TerminalDevice> Drop for Renderer<D> {
    fn drop(&mut self) {
        if self.options.hide_cursor {
            self.write_sequence(&ControlSequence::SetMode(Mode::CursorVisible));
        }
        self.write_sequence(&ControlSequence::SelectGraphicRendition(vec![
            GraphicRendition::Reset,
        ]));
        if self.options.alternate_screen {
            self.write_sequence(&ControlSequence::ResetMode(Mode::AlternateScreen));
        }
        self.device.restore();
    }
}
