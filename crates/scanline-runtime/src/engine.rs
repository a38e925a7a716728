#![forbid(unsafe_code)]

//! The application-facing engine.
//!
//! An `Engine` owns the renderer, the input parser, and the frame
//! profiler, and wires them to a frame-paced driver. The application draws
//! from a per-tick callback that receives the back buffer, the tick, and
//! the events drained since the previous frame; the engine presents and
//! clears the buffer after every callback.
//!
//! Input and rendering are cooperative: the engine drains available input
//! bytes (zero timeout) at the top of each tick, so the byte source is
//! only ever touched from the driver's thread.

use std::collections::VecDeque;
use std::io;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use scanline_core::capabilities::{DeviceAttributes, TerminalCapabilities};
use scanline_core::control::ControlSequence;
use scanline_core::device::TerminalDevice;
use scanline_core::event::Event;
use scanline_core::geometry::Size;
use scanline_core::input_parser::InputParser;
use scanline_render::buffer::Buffer;
use scanline_render::renderer::{Renderer, RendererOptions};

use crate::display_link::{DisplayLink, Tick};
use crate::profiler::{FrameProfiler, FrameStatistics};

/// Default wait for a device-attributes response.
pub const CAPABILITY_TIMEOUT: Duration = Duration::from_millis(250);

/// Everything a render callback gets for one tick.
pub struct Frame<'a> {
    /// The drawing target; presented and cleared after the callback.
    pub buffer: &'a mut Buffer,
    /// Events drained since the previous tick.
    pub events: &'a [Event],
    /// Frame pacing context.
    pub tick: Tick,
}

/// The terminal engine: renderer + input + pacing under one handle.
pub struct Engine<D: TerminalDevice> {
    renderer: Renderer<D>,
    parser: InputParser,
    profiler: Option<FrameProfiler>,
    pending: VecDeque<Event>,
    size: Size,
}

impl<D: TerminalDevice> Engine<D> {
    /// Enter terminal mode and set up the double buffer.
    ///
    /// # Errors
    ///
    /// Fails when the device cannot enter raw mode.
    pub fn new(device: D, options: RendererOptions) -> io::Result<Self> {
        let renderer = Renderer::new(device, options)?;
        let size = renderer.size();
        Ok(Self {
            renderer,
            parser: InputParser::new(),
            profiler: None,
            pending: VecDeque::new(),
            size,
        })
    }

    /// Current terminal size.
    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Direct access to the drawing target (outside the render loop).
    #[inline]
    pub fn back(&mut self) -> &mut Buffer {
        self.renderer.back()
    }

    /// Present the back buffer once, outside the paced loop.
    pub fn present(&mut self) {
        self.renderer.present();
    }

    /// Drain pending events: queued responses, a size change, and any
    /// input bytes that arrive within `timeout`.
    pub fn poll_events(&mut self, timeout: Duration) -> Vec<Event> {
        let mut events: Vec<Event> = self.pending.drain(..).collect();

        let device_size = self.renderer.device().size();
        if device_size != self.size {
            self.size = device_size;
            self.renderer.resize(device_size);
            events.push(Event::Resize(device_size));
        }

        let mut buf = [0u8; 1024];
        // A read error is treated like silence; the next poll retries.
        if let Ok(n) = self.renderer.device_mut().read(&mut buf, timeout)
            && n > 0
        {
            events.extend(self.parser.parse(&buf[..n]));
        }

        events
    }

    /// Run the frame-paced render loop at `fps`.
    ///
    /// Every tick the callback receives a [`Frame`]; afterwards the engine
    /// presents and clears the back buffer, timing the whole frame. The
    /// loop ends when the callback returns [`ControlFlow::Break`] or an
    /// error (the error propagates; terminal restore still happens when
    /// the engine drops).
    pub fn rendering<E>(
        &mut self,
        fps: f64,
        mut callback: impl FnMut(&mut Frame<'_>) -> Result<ControlFlow<()>, E>,
    ) -> Result<(), E> {
        let mut link = DisplayLink::new(fps);
        let mut profiler = self
            .profiler
            .take()
            .unwrap_or_else(|| FrameProfiler::new(fps));

        let result = link.run(|tick| {
            let events = self.poll_events(Duration::ZERO);

            let frame_result = profiler.measure(|| {
                let flow = {
                    let mut frame = Frame {
                        buffer: self.renderer.back(),
                        events: &events,
                        tick,
                    };
                    callback(&mut frame)?
                };
                self.renderer.present();
                self.renderer.back().clear();
                Ok(flow)
            });
            frame_result
        });

        self.profiler = Some(profiler);
        result
    }

    /// Frame statistics from the most recent render loop.
    #[must_use]
    pub fn statistics(&self) -> FrameStatistics {
        self.profiler
            .as_ref()
            .map(FrameProfiler::statistics)
            .unwrap_or_default()
    }

    /// Pass a control sequence straight through to the device.
    pub fn write_sequence(&mut self, sequence: &ControlSequence) {
        self.renderer.write_sequence(sequence);
    }

    /// Pass raw text straight through to the device.
    pub fn write_str(&mut self, text: &str) {
        self.renderer.write_str(text);
    }

    /// Identify the terminal with a primary device-attributes query.
    ///
    /// Waits up to `timeout` (see [`CAPABILITY_TIMEOUT`]) for a response;
    /// events that arrive in the meantime are queued for the next poll.
    /// No response resolves to [`TerminalCapabilities::unknown`].
    pub fn query_capabilities(&mut self, timeout: Duration) -> TerminalCapabilities {
        self.renderer
            .write_sequence(&ControlSequence::DeviceAttributes(DeviceAttributes::Request));

        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return TerminalCapabilities::unknown();
            }

            let mut buf = [0u8; 256];
            let n = self
                .renderer
                .device_mut()
                .read(&mut buf, deadline - now)
                .unwrap_or(0);
            if n == 0 {
                continue;
            }

            for event in self.parser.parse(&buf[..n]) {
                if let Event::Response(DeviceAttributes::Primary(params)) = event {
                    return TerminalCapabilities::from_primary(&params);
                }
                self.pending.push_back(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanline_core::device::TerminalMode;
    use scanline_core::event::{KeyCode, KeyEvent};
    use scanline_core::geometry::Position;
    use scanline_core::style::Style;
    use scanline_render::cell::Cell;

    /// A scripted device: queued input chunks, recorded output, and an
    /// optional auto-response to the DA1 query.
    #[derive(Default)]
    struct ScriptedDevice {
        size: Size,
        input: VecDeque<Vec<u8>>,
        written: Vec<u8>,
        da_response: Option<Vec<u8>>,
    }

    impl ScriptedDevice {
        fn sized(width: u16, height: u16) -> Self {
            Self {
                size: Size::new(width, height),
                ..Self::default()
            }
        }
    }

    impl TerminalDevice for ScriptedDevice {
        fn write(&mut self, bytes: &[u8]) {
            self.written.extend_from_slice(bytes);
            // A DA1 request at the tail triggers the scripted response.
            if self.written.ends_with(b"\x1b[c")
                && let Some(response) = self.da_response.take()
            {
                self.input.push_back(response);
            }
        }

        fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
            match self.input.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Ok(0),
            }
        }

        fn size(&self) -> Size {
            self.size
        }

        fn enter(&mut self, _mode: TerminalMode) -> io::Result<()> {
            Ok(())
        }

        fn restore(&mut self) {}
    }

    fn bare_engine(device: ScriptedDevice) -> Engine<ScriptedDevice> {
        Engine::new(
            device,
            RendererOptions {
                alternate_screen: false,
                hide_cursor: false,
                ..RendererOptions::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn poll_events_decodes_device_input() {
        let mut device = ScriptedDevice::sized(20, 5);
        device.input.push_back(b"q\x1b[A".to_vec());
        let mut engine = bare_engine(device);

        let events = engine.poll_events(Duration::ZERO);
        assert_eq!(
            events,
            vec![
                Event::Key(KeyEvent::new(KeyCode::Char('q'))),
                Event::Key(KeyEvent::new(KeyCode::Up)),
            ]
        );
        assert!(engine.poll_events(Duration::ZERO).is_empty());
    }

    #[test]
    fn input_split_across_polls_is_lossless() {
        let mut device = ScriptedDevice::sized(20, 5);
        device.input.push_back(vec![0x1B]);
        device.input.push_back(vec![0x5B, 0x41]);
        let mut engine = bare_engine(device);

        assert!(engine.poll_events(Duration::ZERO).is_empty());
        assert_eq!(
            engine.poll_events(Duration::ZERO),
            vec![Event::Key(KeyEvent::new(KeyCode::Up))]
        );
    }

    #[test]
    fn size_change_synthesises_resize_and_reallocates() {
        let device = ScriptedDevice::sized(20, 5);
        let mut engine = bare_engine(device);
        assert_eq!(engine.size(), Size::new(20, 5));

        // Shrink the window out from under the engine.
        // (Engine sees it at the next poll.)
        {
            let device = engine.renderer.device_mut();
            device.size = Size::new(10, 4);
        }
        let events = engine.poll_events(Duration::ZERO);
        assert_eq!(events, vec![Event::Resize(Size::new(10, 4))]);
        assert_eq!(engine.size(), Size::new(10, 4));
        assert_eq!(engine.back().size(), Size::new(10, 4));
    }

    #[test]
    fn rendering_presents_and_clears_each_frame() {
        let device = ScriptedDevice::sized(10, 2);
        let mut engine = bare_engine(device);

        let mut frames = 0u32;
        let result: Result<(), io::Error> = engine.rendering(500.0, |frame| {
            frames += 1;
            // The driver cleared the buffer before this tick.
            assert!(frame.buffer.cells().iter().all(|c| *c == Cell::BLANK));
            frame
                .buffer
                .set(Position::new(1, 1), Cell::new('x', Style::new()));
            Ok(if frames == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        });
        assert!(result.is_ok());
        assert_eq!(frames, 3);

        // One bracketed frame of output, then two no-damage frames.
        let written = engine.renderer.device().written.clone();
        let brackets = written
            .windows(b"\x1b[?2026h".len())
            .filter(|w| *w == b"\x1b[?2026h")
            .count();
        assert_eq!(brackets, 1);

        let stats = engine.statistics();
        assert_eq!(stats.rendered, 3);
    }

    #[test]
    fn callback_errors_cancel_the_loop() {
        let device = ScriptedDevice::sized(10, 2);
        let mut engine = bare_engine(device);

        let mut frames = 0u32;
        let result = engine.rendering(500.0, |_frame| {
            frames += 1;
            Err::<ControlFlow<()>, &str>("draw failed")
        });
        assert_eq!(result, Err("draw failed"));
        assert_eq!(frames, 1);
        // The failed frame was still measured.
        assert_eq!(engine.statistics().rendered, 1);
    }

    #[test]
    fn events_reach_the_render_callback() {
        let mut device = ScriptedDevice::sized(10, 2);
        device.input.push_back(b"k".to_vec());
        let mut engine = bare_engine(device);

        let mut seen = Vec::new();
        let _: Result<(), io::Error> = engine.rendering(500.0, |frame| {
            seen.extend_from_slice(frame.events);
            Ok(ControlFlow::Break(()))
        });
        assert_eq!(seen, vec![Event::Key(KeyEvent::new(KeyCode::Char('k')))]);
    }

    #[test]
    fn capability_query_parses_a_response() {
        let mut device = ScriptedDevice::sized(10, 2);
        device.da_response = Some(b"\x1b[?62;22c".to_vec());
        let mut engine = bare_engine(device);

        let caps = engine.query_capabilities(CAPABILITY_TIMEOUT);
        assert!(matches!(caps, TerminalCapabilities::Compatible(f, _) if f.level() == 2));
    }

    #[test]
    fn capability_query_times_out_to_unknown() {
        let device = ScriptedDevice::sized(10, 2);
        let mut engine = bare_engine(device);

        let start = Instant::now();
        let caps = engine.query_capabilities(Duration::from_millis(30));
        assert_eq!(caps, TerminalCapabilities::unknown());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn events_before_the_response_are_queued_not_lost() {
        let mut device = ScriptedDevice::sized(10, 2);
        // A keypress races ahead of the DA response.
        device.input.push_back(b"z".to_vec());
        device.da_response = Some(b"\x1b[?1;2c".to_vec());
        let mut engine = bare_engine(device);

        let caps = engine.query_capabilities(CAPABILITY_TIMEOUT);
        assert!(matches!(caps, TerminalCapabilities::Specific(..)));

        let events = engine.poll_events(Duration::ZERO);
        assert_eq!(events, vec![Event::Key(KeyEvent::new(KeyCode::Char('z')))]);
    }
}
