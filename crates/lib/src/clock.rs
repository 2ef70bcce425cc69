//! Time provider abstraction
//!
//! Cache entries carry expiry deadlines, so anything that decides whether a
//! key is still live asks a [`Clock`] instead of reading system time directly.
//! Production code uses [`SystemClock`]; tests drive a [`ManualClock`] forward
//! to cross TTL boundaries deterministically.
//!
//! # Example
//!
//! ```
//! use exam_archive::{Clock, ManualClock};
//!
//! let clock = ManualClock::new(1_000);
//! assert_eq!(clock.now_millis(), 1_000);
//! clock.advance(250);
//! assert_eq!(clock.now_millis(), 1_250);
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A time provider returning milliseconds since the Unix epoch.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now_millis(&self) -> u64;

    /// Deadline `ttl_millis` from now, saturating instead of wrapping.
    fn deadline_after(&self, ttl_millis: u64) -> u64 {
        self.now_millis().saturating_add(ttl_millis)
    }
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to.
///
/// Unlike wall time, two reads with no `advance()` in between always agree,
/// which keeps expiry assertions exact.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `millis`.
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    /// Move the clock forward by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, ms: u64) {
        self.millis.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}
