//! Timestamp sources for shard parts.
//!
//! Conflicts between parts are resolved purely by timestamp, so every
//! producer feeding one collection should use the same kind of clock.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::Utc;

/// A source of part timestamps, in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Last value handed out by [`SystemClock`], in microseconds.
static LAST_SYSTEM_MICROS: AtomicI64 = AtomicI64::new(0);

/// Wall-clock seconds with microsecond precision.
///
/// Strictly increasing within one process even if the wall clock stalls or
/// steps back, so a part built later in the same process always wins.
/// Skew between hosts is not corrected; use [`LogicalClock`] for that.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        let wall = Utc::now().timestamp_micros();
        let previous = LAST_SYSTEM_MICROS
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(wall.max(last + 1))
            })
            .unwrap_or(wall);
        let micros = wall.max(previous + 1);
        micros as f64 / 1_000_000.0
    }
}

/// Monotonic counter for one collection-build epoch.
///
/// An orchestrator creates one per scan and hands it to every producer, which
/// removes any dependence on host clocks.
#[derive(Debug, Default)]
pub struct LogicalClock {
    counter: AtomicU64,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Start counting after `start`; the first tick is `start + 1`.
    pub fn starting_at(start: u64) -> Self {
        LogicalClock {
            counter: AtomicU64::new(start),
        }
    }

    /// The most recent tick handed out.
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }
}

impl Clock for LogicalClock {
    fn now(&self) -> f64 {
        (self.counter.fetch_add(1, Ordering::AcqRel) + 1) as f64
    }
}
