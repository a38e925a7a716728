#![forbid(unsafe_code)]

//! The terminal-device boundary.
//!
//! The engine is platform-agnostic: everything it needs from the outside
//! world is a byte sink, an input byte source, a size observer, and mode
//! enter/leave hooks. Platform crates (and test doubles) implement
//! [`TerminalDevice`]; the renderer and engine consume it.

use std::io;
use std::time::Duration;

use crate::geometry::Size;

/// Terminal I/O discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminalMode {
    /// Line-buffered, echoing: the state a shell expects.
    #[default]
    Canonical,
    /// Unbuffered, no echo: byte-at-a-time input for the engine.
    Raw,
}

/// An opaque terminal device.
///
/// Writes are best-effort: implementations swallow I/O errors and the next
/// frame retries implicitly. Reads are bounded by a timeout so capability
/// queries and the render loop never block indefinitely.
pub trait TerminalDevice {
    /// Best-effort blocking write. Errors are ignored.
    fn write(&mut self, bytes: &[u8]);

    /// Read available input bytes into `buf`, waiting at most `timeout`.
    ///
    /// Returns the number of bytes read; 0 means the timeout elapsed with
    /// no input (not end-of-stream).
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;

    /// Current window size in cells.
    fn size(&self) -> Size;

    /// Switch the device between canonical and raw discipline.
    fn enter(&mut self, mode: TerminalMode) -> io::Result<()>;

    /// Restore the discipline the device had before the first `enter`.
    ///
    /// Idempotent; called from drop paths.
    fn restore(&mut self);
}

impl<D: TerminalDevice + ?Sized> TerminalDevice for &mut D {
    fn write(&mut self, bytes: &[u8]) {
        (**self).write(bytes);
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        (**self).read(buf, timeout)
    }

    fn size(&self) -> Size {
        (**self).size()
    }

    fn enter(&mut self, mode: TerminalMode) -> io::Result<()> {
        (**self).enter(mode)
    }

    fn restore(&mut self) {
        (**self).restore();
    }
}
