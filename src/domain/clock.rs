//! Sources of "now" for timestamping tasks.
//!
//! Timestamps are stored as ISO-8601 UTC strings with millisecond precision
//! and a `Z` suffix (`2025-01-15T10:30:00.000Z`). [`SystemClock`] reads the
//! wall clock; [`ManualClock`] is driven by hand and makes ordering and
//! `updatedAt` behaviour reproducible in tests.

use std::fmt;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use parking_lot::Mutex;

/// Formats an instant in the canonical stored form.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use tasklist::domain::format_instant;
///
/// let at = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
/// assert_eq!(format_instant(at), "2025-01-15T10:30:00.000Z");
/// ```
pub fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A source of the current instant.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// The current instant in the canonical stored form.
    fn now_iso(&self) -> String {
        format_instant(self.now())
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The current wall-clock instant in the canonical stored form.
pub fn now() -> String {
    SystemClock.now_iso()
}

/// A hand-driven clock.
///
/// Each call to [`Clock::now`] returns the current reading and then moves
/// it forward by the configured step (zero by default), so a ticking clock
/// hands out strictly increasing instants.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use tasklist::domain::{Clock, ManualClock};
///
/// let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
/// let clock = ManualClock::ticking(start, Duration::milliseconds(5));
/// assert_eq!(clock.now_iso(), "2025-01-01T00:00:00.000Z");
/// assert_eq!(clock.now_iso(), "2025-01-01T00:00:00.005Z");
/// ```
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

#[derive(Debug)]
struct ManualState {
    current: DateTime<Utc>,
    step: Duration,
}

impl ManualClock {
    /// A clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self::ticking(start, Duration::zero())
    }

    /// A clock starting at `start` that advances by `step` after every reading.
    pub fn ticking(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            state: Mutex::new(ManualState {
                current: start,
                step,
            }),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock();
        state.current += by;
    }

    /// Jumps the clock to `to`.
    pub fn set(&self, to: DateTime<Utc>) {
        self.state.lock().current = to;
    }

    /// The next reading, without advancing.
    pub fn peek(&self) -> DateTime<Utc> {
        self.state.lock().current
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut state = self.state.lock();
        let reading = state.current;
        state.current = reading + state.step;
        reading
    }
}
