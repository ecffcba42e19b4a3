//! Time sources for the bucket.
//!
//! A [`Clock`] returns the current instant as an integer in some unit; the
//! bucket's `fillTime` and every returned wait time are expressed in that same
//! unit. All clocks shipped here count milliseconds except [`ManualClock`],
//! which is unitless.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A source of the current instant.
///
/// Any `Fn() -> u64` closure is a clock:
///
/// ```
/// use simple_token_bucket::{BucketOptions, TokenBucket};
///
/// let bucket = TokenBucket::with_clock(BucketOptions::new(1, 1, 1), || 42u64).unwrap();
/// assert_eq!(bucket.last_fill(), 42);
/// ```
pub trait Clock {
    /// Current instant in clock units.
    fn now(&self) -> u64;
}

impl<F> Clock for F
where
    F: Fn() -> u64,
{
    fn now(&self) -> u64 {
        self()
    }
}

/// Milliseconds elapsed since the clock was created.
///
/// Backed by [`Instant`], so it never goes backwards. This is the default clock.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose zero is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> u64 {
        // u64 milliseconds overflow after ~584 million years
        self.origin.elapsed().as_millis() as u64
    }
}

/// Wall-clock milliseconds since the UNIX epoch.
///
/// Can jump backwards if the system time is adjusted; the bucket treats a
/// backwards step as zero elapsed time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same counter, so a test can keep one handle and give
/// another to the bucket.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start`.
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Move the clock forward by `delta` units.
    pub fn advance(&self, delta: u64) {
        self.now.fetch_add(delta, Ordering::SeqCst);
    }

    /// Set the clock to an absolute reading.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
