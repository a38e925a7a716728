#![forbid(unsafe_code)]

//! Frame-paced callback driver.
//!
//! A `DisplayLink` wakes at a fixed cadence derived from a target frame
//! rate and invokes a callback once per tick. Tick timestamps always fall
//! on the grid `epoch + n·interval`, so a slow frame delays the *next*
//! wake-up to the following grid point instead of drifting the whole
//! schedule.
//!
//! Pausing skips the callback while timestamps keep advancing; resuming
//! therefore continues from the current tick with no catch-up burst.
//! Callback errors propagate out of [`DisplayLink::run`] and end the loop;
//! returning [`ControlFlow::Break`] cancels it cleanly.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Per-tick context handed to the render callback.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    /// The grid timestamp of this tick.
    pub timestamp: Instant,
    /// The target interval (1 / fps).
    pub duration: Duration,
    /// Whether the link is currently paused.
    pub paused: bool,
}

/// Shared pause switch for a running link.
#[derive(Debug, Clone, Default)]
pub struct PauseHandle(Arc<AtomicBool>);

impl PauseHandle {
    /// Skip callbacks from the next tick on.
    pub fn pause(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Resume callbacks from the current tick, without catch-up.
    pub fn resume(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    /// Whether the link is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A fixed-rate tick source.
#[derive(Debug)]
pub struct DisplayLink {
    interval: Duration,
    paused: PauseHandle,
}

impl DisplayLink {
    /// Create a link targeting `fps` frames per second.
    ///
    /// # Panics
    ///
    /// Panics if `fps` is not a positive finite number.
    #[must_use]
    pub fn new(fps: f64) -> Self {
        assert!(fps.is_finite() && fps > 0.0, "target fps must be > 0");
        Self {
            interval: Duration::from_secs_f64(1.0 / fps),
            paused: PauseHandle::default(),
        }
    }

    /// The tick interval.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// A pause switch usable from outside the run loop.
    #[must_use]
    pub fn pause_handle(&self) -> PauseHandle {
        self.paused.clone()
    }

    /// Run the tick loop until the callback breaks or errors.
    ///
    /// Each iteration sleeps to the next grid point `epoch + n·interval`,
    /// then invokes `callback` with the tick (unless paused). Errors
    /// propagate immediately; the link can be run again afterwards.
    pub fn run<E>(
        &mut self,
        mut callback: impl FnMut(Tick) -> Result<ControlFlow<()>, E>,
    ) -> Result<(), E> {
        let epoch = Instant::now();

        loop {
            // Next grid point strictly after now.
            let now = Instant::now();
            let interval_nanos = self.interval.as_nanos().max(1);
            let elapsed_intervals = (now - epoch).as_nanos() / interval_nanos;
            let next = epoch + Duration::from_nanos(((elapsed_intervals + 1) * interval_nanos) as u64);
            if next > now {
                std::thread::sleep(next - now);
            }

            let paused = self.paused.is_paused();
            if paused {
                continue;
            }

            let tick = Tick {
                timestamp: next,
                duration: self.interval,
                paused,
            };
            match callback(tick)? {
                ControlFlow::Continue(()) => {}
                ControlFlow::Break(()) => return Ok(()),
            }
        }
    }
}
