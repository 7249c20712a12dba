//! Time source for blocking delays.
//!
//! Every actuation, backoff and idle period goes through a [`Clock`], so the
//! same control code runs against wall-clock sleeps on the robot and against
//! a virtual clock in tests.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source with a blocking delay.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;

    /// Block for `duration`; returns only after it has elapsed.
    fn sleep(&self, duration: Duration);
}

/// Clock shared by the controller, the drive and the client.
pub type SharedClock = Arc<dyn Clock>;

/// Wall clock backed by `std::thread::sleep`.
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Virtual clock: `sleep` advances time instantly.
///
/// Clones share the same timeline, so a test can keep a handle while the
/// controller owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualClockInner>>,
}

#[derive(Debug, Default)]
struct ManualClockInner {
    now: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle for components, keeping `self` for inspection
    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }

    /// Move time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        self.inner.lock().now += duration;
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.inner.lock().sleeps.clone()
    }

    /// Number of sleeps of exactly `duration`
    pub fn sleeps_of(&self, duration: Duration) -> usize {
        self.inner
            .lock()
            .sleeps
            .iter()
            .filter(|d| **d == duration)
            .count()
    }

    pub fn clear_sleeps(&self) {
        self.inner.lock().sleeps.clear();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.inner.lock().now
    }

    fn sleep(&self, duration: Duration) {
        let mut inner = self.inner.lock();
        inner.now += duration;
        inner.sleeps.push(duration);
    }
}
