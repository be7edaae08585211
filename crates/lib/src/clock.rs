//! Time source for record creation timestamps.
//!
//! Creation time is the tiebreaker between records sharing an order value, so
//! tests need to control it. [`SystemClock`] reads real time; [`FixedClock`]
//! starts at a chosen instant and ticks one millisecond per read.
//!
//! # Example
//!
//! ```
//! use orderable::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! assert!(clock.now_millis() > 0);
//! assert!(clock.now_rfc3339().contains('T'));
//! ```

use std::fmt::Debug;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// A provider of the current time.
pub trait Clock: Send + Sync + Debug {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;

    /// The current time as an RFC3339 string.
    fn now_rfc3339(&self) -> String {
        format_millis(self.now_millis())
    }
}

/// Formats epoch milliseconds as RFC3339, falling back to the epoch.
pub fn format_millis(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default()
        .to_rfc3339()
}

/// Real wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn now_rfc3339(&self) -> String {
        Utc::now().to_rfc3339()
    }
}

/// Deterministic clock that advances by one millisecond on every read.
///
/// Reads are strictly increasing unless the clock is held, which makes
/// creation order predictable in tests. [`hold`](FixedClock::hold) freezes it
/// so several records can share a timestamp.
///
/// ```
/// use orderable::{Clock, FixedClock};
///
/// let clock = FixedClock::new(1000);
/// assert_eq!(clock.now_millis(), 1000);
/// assert_eq!(clock.now_millis(), 1001);
///
/// let _hold = clock.hold();
/// assert_eq!(clock.now_millis(), clock.now_millis());
/// ```
pub struct FixedClock {
    state: Mutex<FixedClockState>,
}

struct FixedClockState {
    millis: u64,
    held: bool,
}

/// Guard that keeps a [`FixedClock`] frozen until dropped.
pub struct ClockHold<'a>(&'a FixedClock);

impl Drop for ClockHold<'_> {
    fn drop(&mut self) {
        self.0.state.lock().unwrap().held = false;
    }
}

impl FixedClock {
    pub fn new(millis: u64) -> Self {
        Self {
            state: Mutex::new(FixedClockState {
                millis,
                held: false,
            }),
        }
    }

    /// Freezes the clock until the returned guard is dropped.
    pub fn hold(&self) -> ClockHold<'_> {
        self.state.lock().unwrap().held = true;
        ClockHold(self)
    }

    pub fn advance(&self, ms: u64) {
        self.state.lock().unwrap().millis += ms;
    }

    /// Current value, without advancing.
    pub fn get(&self) -> u64 {
        self.state.lock().unwrap().millis
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        let mut state = self.state.lock().unwrap();
        let t = state.millis;
        if !state.held {
            state.millis += 1;
        }
        t
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1_704_067_200_000)
    }
}

impl Debug for FixedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("FixedClock")
            .field("millis", &state.millis)
            .field("held", &state.held)
            .finish()
    }
}
