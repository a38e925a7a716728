#![forbid(unsafe_code)]

//! Frame-time profiling in O(1) per sample.
//!
//! The profiler keeps the last N frame times in a fixed-capacity ring and
//! maintains running extrema incrementally: pushing a sample is O(1)
//! unless the evicted sample *was* the current minimum or maximum, in
//! which case the extrema are recomputed with one linear scan. Dropped
//! frames are counted against the target interval.
//!
//! The profiler is owned by the driver for the lifetime of one render
//! loop. It is deliberately not `Clone`; a copy would fork the dropped/
//! rendered counters.

use std::time::{Duration, Instant};

/// Fixed-capacity FIFO of duration samples with incremental min/max.
#[derive(Debug)]
pub struct SampleRing {
    samples: Vec<Duration>,
    capacity: usize,
    /// Index of the oldest sample once the ring is full.
    head: usize,
    min: Duration,
    max: Duration,
}

impl SampleRing {
    /// Create an empty ring holding up to `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be > 0");
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            min: Duration::MAX,
            max: Duration::ZERO,
        }
    }

    /// Number of stored samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Push a sample, evicting the oldest once full.
    pub fn push(&mut self, sample: Duration) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            let evicted = std::mem::replace(&mut self.samples[self.head], sample);
            self.head = (self.head + 1) % self.capacity;
            if evicted == self.min || evicted == self.max {
                self.recompute_extrema();
                return;
            }
        }
        self.min = self.min.min(sample);
        self.max = self.max.max(sample);
    }

    fn recompute_extrema(&mut self) {
        self.min = Duration::MAX;
        self.max = Duration::ZERO;
        for &s in &self.samples {
            self.min = self.min.min(s);
            self.max = self.max.max(s);
        }
    }

    /// Smallest stored sample; zero when empty.
    #[inline]
    pub fn min(&self) -> Duration {
        if self.is_empty() { Duration::ZERO } else { self.min }
    }

    /// Largest stored sample; zero when empty.
    #[inline]
    pub fn max(&self) -> Duration {
        if self.is_empty() { Duration::ZERO } else { self.max }
    }

    /// The most recently pushed sample; zero when empty.
    pub fn newest(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        if self.samples.len() < self.capacity {
            self.samples[self.samples.len() - 1]
        } else {
            // head points at the oldest; the newest sits just behind it.
            self.samples[(self.head + self.capacity - 1) % self.capacity]
        }
    }

    /// Arithmetic mean of the stored samples; zero when empty.
    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.samples.iter().sum();
        total / self.samples.len() as u32
    }
}

/// A snapshot of frame statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStatistics {
    /// The most recent frame time.
    pub current: Duration,
    /// Mean frame time over the ring.
    pub average: Duration,
    /// Frames measured in total.
    pub rendered: u64,
    /// Frames that exceeded the target interval.
    pub dropped: u64,
    /// Highest observed rate: the reciprocal of the fastest frame.
    pub fps_max: FramesPerSecond,
    /// Lowest observed rate: the reciprocal of the slowest frame.
    pub fps_min: FramesPerSecond,
}

/// A frame rate in hertz. Wraps an `f64` with total equality so the
/// statistics snapshot stays `Eq`-comparable in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FramesPerSecond(pub f64);

impl PartialEq for FramesPerSecond {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FramesPerSecond {}

/// Frame-time profiler with a target interval.
#[derive(Debug)]
pub struct FrameProfiler {
    target: Duration,
    ring: SampleRing,
    rendered: u64,
    dropped: u64,
}

impl FrameProfiler {
    /// A profiler for the given target frame rate.
    ///
    /// The ring holds `max(60, 2·fps)` samples, at least a second of
    /// history at any reasonable rate.
    #[must_use]
    pub fn new(fps: f64) -> Self {
        assert!(fps.is_finite() && fps > 0.0, "target fps must be > 0");
        let capacity = (2.0 * fps).ceil() as usize;
        Self {
            target: Duration::from_secs_f64(1.0 / fps),
            ring: SampleRing::with_capacity(capacity.max(60)),
            rendered: 0,
            dropped: 0,
        }
    }

    /// The target frame interval.
    #[inline]
    pub fn target(&self) -> Duration {
        self.target
    }

    /// Time an operation and record its duration as one frame.
    pub fn measure<T>(&mut self, op: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let value = op();
        self.record(start.elapsed());
        value
    }

    /// Record one frame's duration.
    pub fn record(&mut self, elapsed: Duration) {
        self.rendered += 1;
        if elapsed > self.target {
            self.dropped += 1;
            #[cfg(feature = "tracing")]
            tracing::debug!(?elapsed, target = ?self.target, "frame over budget");
        }
        self.ring.push(elapsed);
    }

    /// Current statistics snapshot. All zeros before the first sample.
    #[must_use]
    pub fn statistics(&self) -> FrameStatistics {
        let min = self.ring.min();
        let max = self.ring.max();
        FrameStatistics {
            current: self.ring.newest(),
            average: self.ring.average(),
            rendered: self.rendered,
            dropped: self.dropped,
            fps_max: FramesPerSecond(reciprocal(min)),
            fps_min: FramesPerSecond(reciprocal(max)),
        }
    }
}

fn reciprocal(d: Duration) -> f64 {
    if d.is_zero() { 0.0 } else { 1.0 / d.as_secs_f64() }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The incremental extrema always match a from-scratch scan of the
        /// retained window.
        #[test]
        fn extrema_match_reference(
            capacity in 1usize..16,
            samples in proptest::collection::vec(0u64..100, 0..64),
        ) {
            let mut ring = SampleRing::with_capacity(capacity);
            for &s in &samples {
                ring.push(Duration::from_millis(s));
            }

            let window: Vec<Duration> = samples
                .iter()
                .rev()
                .take(capacity)
                .rev()
                .map(|&s| Duration::from_millis(s))
                .collect();

            if window.is_empty() {
                prop_assert_eq!(ring.min(), Duration::ZERO);
                prop_assert_eq!(ring.max(), Duration::ZERO);
            } else {
                prop_assert_eq!(ring.min(), *window.iter().min().unwrap());
                prop_assert_eq!(ring.max(), *window.iter().max().unwrap());
                prop_assert_eq!(ring.newest(), *window.last().unwrap());
            }
        }
    }
}
