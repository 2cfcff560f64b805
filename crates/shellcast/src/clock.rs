//! Wall-clock sources.
//!
//! Recorders stamp events with absolute epoch milliseconds and the playback
//! engine maps wall-clock time onto its virtual timeline. Both read time
//! through the [`Clock`] trait so tests can drive them with a
//! [`ManualClock`] instead of sleeping.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

/// A source of wall-clock time in Unix epoch milliseconds.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;

    /// Block the current thread for `duration`.
    ///
    /// Test clocks advance their logical time instead of sleeping.
    fn sleep(&self, duration: Duration);
}

/// Shared handle to a clock.
pub type SharedClock = Arc<dyn Clock>;

/// Production clock.
///
/// The epoch offset is sampled once at construction and then advanced with a
/// monotonic [`Instant`], so readings never go backwards even if the system
/// clock is adjusted mid-session.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin_millis: i64,
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Create a new system clock anchored at the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin_millis: chrono::Utc::now().timestamp_millis(),
            origin: Instant::now(),
        }
    }

    /// Create a shared system clock.
    #[must_use]
    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let elapsed = self.origin.elapsed().as_millis();
        self.origin_millis
            .saturating_add(i64::try_from(elapsed).unwrap_or(i64::MAX))
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Manually driven clock for deterministic tests and offline rendering.
///
/// `sleep` advances logical time without blocking.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock reading `start_millis`.
    #[must_use]
    pub const fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    /// Create a shared clock reading `start_millis`.
    #[must_use]
    pub fn shared(start_millis: i64) -> Arc<Self> {
        Arc::new(Self::new(start_millis))
    }

    /// Advance the clock.
    pub fn advance(&self, duration: Duration) {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Advance the clock by a number of milliseconds.
    pub fn advance_millis(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Set the clock to an absolute reading. May move backwards.
    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
