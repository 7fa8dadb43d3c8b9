/*! Time structures.

The `time` module contains structures used to represent absolute time and to convert its progress
into the two periodic ticks that drive the protocol timers.

 - [Instant] is used to represent absolute time.
 - [Duration] is used to represet relative time.
 - [Ticker] counts the slow (500ms) and fast (200ms) timer ticks that elapsed.

[Instant]: struct.Instant.html
[Duration]: struct.Duration.html
[Ticker]: struct.Ticker.html
*/
use core::{fmt, ops};
pub use core::time::Duration;

/// Interval of the slow timer, two ticks per second.
///
/// All protocol timers except the delayed acknowledgment count in these units.
pub const SLOW_TICK: Duration = Duration::from_millis(500);

/// Interval of the fast timer which flushes delayed acknowledgments.
pub const FAST_TICK: Duration = Duration::from_millis(200);

/// A representation of an absolute time value.
///
/// The `Instant` type is a wrapper around a `i64` value that
/// represents a number of milliseconds, monotonically increasing
/// since an arbitrary moment in time, such as the start of a simulation.
///
/// * A value of `0` is inherently arbitrary.
/// * A value less than `0` indicates a time before the starting
///   point.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Instant {
    /// Milliseconds since the arbitrary epoch.
    pub millis: i64,
}

/// Converts the progress of an [`Instant`] clock into timer ticks.
///
/// Each worker owns one and polls it from its dispatch loop. Ticks that were missed because the
/// loop was busy are all reported, the timers must observe every one of them to keep their
/// granularity.
///
/// [`Instant`]: struct.Instant.html
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ticker {
    next_slow: Instant,
    next_fast: Instant,
}

/// The number of ticks that elapsed in a call to `Ticker::advance`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Ticks {
    /// Number of elapsed slow timer ticks.
    pub slow: u32,
    /// Number of elapsed fast timer ticks.
    pub fast: u32,
}

impl Instant {
    /// Create a new `Instant` from a number of milliseconds.
    pub fn from_millis<T: Into<i64>>(millis: T) -> Instant {
        Instant { millis: millis.into() }
    }

    /// Create a new `Instant` from a number of seconds.
    pub fn from_secs<T: Into<i64>>(secs: T) -> Instant {
        Instant { millis: secs.into() * 1000 }
    }

    /// The fractional number of milliseconds that have passed
    /// since the beginning of time.
    pub fn millis(&self) -> i64 {
        self.millis % 1000
    }

    /// The number of whole seconds that have passed since the
    /// beginning of time.
    pub fn secs(&self) -> i64 {
        self.millis / 1000
    }

    /// The total number of milliseconds that have passed since
    /// the biginning of time.
    pub fn total_millis(&self) -> i64 {
        self.millis
    }
}

impl Ticker {
    /// Start counting ticks at `start`, the first of each fires one interval later.
    pub fn new(start: Instant) -> Self {
        Ticker {
            next_slow: start + SLOW_TICK,
            next_fast: start + FAST_TICK,
        }
    }

    /// Count all ticks that elapsed up to and including `now`.
    pub fn advance(&mut self, now: Instant) -> Ticks {
        Ticks {
            slow: Self::elapse(&mut self.next_slow, now, SLOW_TICK),
            fast: Self::elapse(&mut self.next_fast, now, FAST_TICK),
        }
    }

    /// The instant at which the next tick of either timer fires.
    pub fn next_deadline(&self) -> Instant {
        self.next_slow.min(self.next_fast)
    }

    fn elapse(next: &mut Instant, now: Instant, interval: Duration) -> u32 {
        let mut count = 0;
        while *next <= now {
            *next += interval;
            count += 1;
        }
        count
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:03}s", self.secs(), self.millis())
    }
}

impl ops::Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        Instant::from_millis(self.millis + rhs.as_millis() as i64)
    }
}

impl ops::AddAssign<Duration> for Instant {
    fn add_assign(&mut self, rhs: Duration) {
        self.millis += rhs.as_millis() as i64;
    }
}

impl ops::Sub<Duration> for Instant {
    type Output = Instant;

    fn sub(self, rhs: Duration) -> Instant {
        Instant::from_millis(self.millis - rhs.as_millis() as i64)
    }
}

impl ops::Sub<Instant> for Instant {
    type Output = Duration;

    fn sub(self, rhs: Instant) -> Duration {
        Duration::from_millis((self.millis - rhs.millis).abs() as u64)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_instant_ops() {
        assert_eq!(Instant::from_millis(4) + Duration::from_millis(6), Instant::from_millis(10));
        assert_eq!(Instant::from_millis(7) - Duration::from_millis(5), Instant::from_millis(2));
        assert_eq!(Instant::from_millis(7) - Instant::from_millis(5), Duration::from_millis(2));
    }

    #[test]
    fn test_instant_getters() {
        let instant = Instant::from_millis(5674);
        assert_eq!(instant.secs(), 5);
        assert_eq!(instant.millis(), 674);
        assert_eq!(instant.total_millis(), 5674);
    }

    #[test]
    fn test_instant_display() {
        assert_eq!(format!("{}", Instant::from_millis(5674)), "5.674s");
        assert_eq!(format!("{}", Instant::from_millis(5000)), "5.000s");
        assert_eq!(format!("{}", Instant::from_millis(5005)), "5.005s");
    }

    #[test]
    fn ticker_counts_elapsed() {
        let mut ticker = Ticker::new(Instant::from_millis(0));
        assert_eq!(ticker.advance(Instant::from_millis(100)), Ticks { slow: 0, fast: 0 });
        assert_eq!(ticker.advance(Instant::from_millis(200)), Ticks { slow: 0, fast: 1 });
        assert_eq!(ticker.advance(Instant::from_millis(1000)), Ticks { slow: 2, fast: 4 });
        assert_eq!(ticker.next_deadline(), Instant::from_millis(1200));
    }

    #[test]
    fn ticker_catches_up() {
        let mut ticker = Ticker::new(Instant::from_millis(0));
        assert_eq!(ticker.advance(Instant::from_secs(10)), Ticks { slow: 20, fast: 50 });
        assert_eq!(ticker.advance(Instant::from_secs(10)), Ticks::default());
    }
}
