#![forbid(unsafe_code)]

//! Buffered, scope-owned output over a terminal device.
//!
//! A `FrameSink` collects the bytes of one frame and hands them to the
//! device in page-sized writes. The synchronized variant brackets its
//! lifetime in DEC 2026 set/reset: the reset is emitted from `Drop`, so
//! the bracket closes on every exit path, including panics and early
//! returns. One sink exists per frame; it owns its SGR-independent byte
//! buffer exclusively and flushes any remainder when it goes out of scope.

use scanline_core::control::{ControlSequence, Mode};
use scanline_core::device::TerminalDevice;
use scanline_core::encode::Encoding;

/// Sink buffer capacity: one page.
pub const SINK_CAPACITY: usize = 4096;

/// A buffered byte sink for one frame's output.
pub struct FrameSink<'d, D: TerminalDevice> {
    device: &'d mut D,
    encoding: Encoding,
    buf: Vec<u8>,
    synchronized: bool,
}

impl<'d, D: TerminalDevice> FrameSink<'d, D> {
    /// A plain sink with no synchronized-update bracket.
    pub fn new(device: &'d mut D, encoding: Encoding) -> Self {
        Self {
            device,
            encoding,
            buf: Vec::with_capacity(SINK_CAPACITY),
            synchronized: false,
        }
    }

    /// A sink that opens a synchronized update now and guarantees the
    /// closing reset when it is dropped.
    pub fn synchronized(device: &'d mut D, encoding: Encoding) -> Self {
        let mut sink = Self::new(device, encoding);
        sink.synchronized = true;
        sink.sequence(&ControlSequence::SetMode(Mode::SynchronizedUpdate));
        sink
    }

    /// The encoding this sink writes sequences in.
    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Append raw bytes.
    ///
    /// A fragment larger than the remaining capacity flushes the buffer
    /// first, then appends; fragments are never split.
    pub fn put(&mut self, bytes: &[u8]) {
        if self.buf.len() + bytes.len() > SINK_CAPACITY {
            self.flush();
        }
        self.buf.extend_from_slice(bytes);
    }

    /// Append a string's bytes.
    #[inline]
    pub fn put_str(&mut self, s: &str) {
        self.put(s.as_bytes());
    }

    /// Append one character.
    pub fn put_char(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.put(c.encode_utf8(&mut utf8).as_bytes());
    }

    /// Append an encoded control sequence.
    pub fn sequence(&mut self, sequence: &ControlSequence) {
        let mut scratch = Vec::with_capacity(16);
        self.encoding.encode_into(sequence, &mut scratch);
        self.put(&scratch);
    }

    /// Drain the buffer to the device.
    pub fn flush(&mut self) {
        if !self.buf.is_empty() {
            self.device.write(&self.buf);
            self.buf.clear();
        }
    }
}

impl<D: TerminalDevice> Drop for FrameSink<'_, D> {
    fn drop(&mut self) {
        if self.synchronized {
            self.sequence(&ControlSequence::ResetMode(Mode::SynchronizedUpdate));
        }
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanline_core::device::TerminalMode;
    use scanline_core::geometry::Size;
    use std::io;
    use std::time::Duration;

    /// Device double that records every write as a separate chunk.
    #[derive(Default)]
    struct Recorder {
        chunks: Vec<Vec<u8>>,
    }

    impl Recorder {
        fn bytes(&self) -> Vec<u8> {
            self.chunks.concat()
        }
    }

    impl TerminalDevice for Recorder {
        fn write(&mut self, bytes: &[u8]) {
            self.chunks.push(bytes.to_vec());
        }

        fn read(&mut self, _buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
            Ok(0)
        }

        fn size(&self) -> Size {
            Size::new(80, 24)
        }

        fn enter(&mut self, _mode: TerminalMode) -> io::Result<()> {
            Ok(())
        }

        fn restore(&mut self) {}
    }

    #[test]
    fn bytes_are_buffered_until_flush() {
        let mut device = Recorder::default();
        {
            let mut sink = FrameSink::new(&mut device, Encoding::SevenBit);
            sink.put_str("hello");
            assert!(sink.device.chunks.is_empty());
            sink.flush();
        }
        assert_eq!(device.bytes(), b"hello");
    }

    #[test]
    fn drop_flushes_the_remainder() {
        let mut device = Recorder::default();
        {
            let mut sink = FrameSink::new(&mut device, Encoding::SevenBit);
            sink.put_str("tail");
        }
        assert_eq!(device.bytes(), b"tail");
    }

    #[test]
    fn oversized_fragment_flushes_first() {
        let mut device = Recorder::default();
        {
            let mut sink = FrameSink::new(&mut device, Encoding::SevenBit);
            sink.put_str("prefix");
            let big = vec![b'x'; SINK_CAPACITY];
            sink.put(&big);
            // The prefix was flushed on its own; the big fragment is intact.
            assert_eq!(sink.device.chunks.len(), 1);
            assert_eq!(sink.device.chunks[0], b"prefix");
        }
        assert_eq!(device.chunks.len(), 2);
        assert_eq!(device.chunks[1].len(), SINK_CAPACITY);
    }

    #[test]
    fn synchronized_sink_brackets_its_scope() {
        let mut device = Recorder::default();
        {
            let mut sink = FrameSink::synchronized(&mut device, Encoding::SevenBit);
            sink.put_str("body");
        }
        assert_eq!(device.bytes(), b"\x1b[?2026hbody\x1b[?2026l");
    }

    #[test]
    fn synchronized_bracket_closes_on_panic() {
        let mut device = Recorder::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut sink = FrameSink::synchronized(&mut device, Encoding::SevenBit);
            sink.put_str("partial");
            panic!("render callback failure");
        }));
        assert!(result.is_err());
        assert_eq!(device.bytes(), b"\x1b[?2026hpartial\x1b[?2026l");
    }

    #[test]
    fn sequences_are_encoded_in_the_sink_encoding() {
        let mut device = Recorder::default();
        {
            let mut sink = FrameSink::new(&mut device, Encoding::EightBit);
            sink.sequence(&ControlSequence::CursorUp(3));
        }
        assert_eq!(device.bytes(), b"\x9b3A");
    }

    #[test]
    fn put_char_handles_multibyte() {
        let mut device = Recorder::default();
        {
            let mut sink = FrameSink::new(&mut device, Encoding::SevenBit);
            sink.put_char('日');
        }
        assert_eq!(device.bytes(), "日".as_bytes());
    }
}
