//! Counter samples and wraparound-aware deltas
//!
//! A counter only ever grows until it wraps back to zero after the maximum
//! value of its width. Resets are not inferred here; discontinuities are
//! reported out-of-band (see `interface::discontinuity`).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Width of the counter domain of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterWidth {
    /// ifInOctets / ifOutOctets
    Bits32,
    /// ifHCInOctets / ifHCOutOctets
    Bits64,
}

impl CounterWidth {
    /// Largest representable counter value before wrapping
    pub fn max_value(self) -> u64 {
        match self {
            CounterWidth::Bits32 => u32::MAX as u64,
            CounterWidth::Bits64 => u64::MAX,
        }
    }
}

/// One counter reading and the instant it was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSample {
    pub value: u64,
    pub timestamp: DateTime<Utc>,
}

impl CounterSample {
    pub fn new(value: u64, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }
}

/// Difference between two consecutive samples of the same counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub value: u64,
    pub time: Duration,
}

impl Delta {
    pub fn seconds(&self) -> f64 {
        // Whole milliseconds are plenty for poll intervals.
        self.time.num_milliseconds() as f64 / 1000.0
    }
}

/// Delta between `previous` and `current`, correcting for a single wrap.
///
/// Returns `None` when the samples are not strictly ordered in time; no rate
/// can be derived from them.
pub fn delta(
    previous: &CounterSample,
    current: &CounterSample,
    width: CounterWidth,
) -> Option<Delta> {
    let max = width.max_value();
    debug_assert!(previous.value <= max && current.value <= max, "sample outside counter width");

    let time = current.timestamp - previous.timestamp;
    if time <= Duration::zero() {
        return None;
    }

    let value = if current.value >= previous.value {
        current.value - previous.value
    } else {
        // (max + 1 - previous) + current, ordered so it cannot overflow
        (max - previous.value) + current.value + 1
    };

    Some(Delta { value, time })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::at;

    #[test]
    fn test_plain_increment() {
        let prev = CounterSample::new(1_000, at(0));
        let d = delta(&prev, &CounterSample::new(4_000, at(30)), CounterWidth::Bits32).unwrap();
        assert_eq!(d.value, 3_000);
        assert_eq!(d.time, Duration::seconds(30));
        assert_eq!(d.seconds(), 30.0);
    }

    #[test]
    fn test_wraparound_32() {
        let prev = CounterSample::new(u32::MAX as u64 - 4, at(0));
        let cur = CounterSample::new(3, at(10));
        assert_eq!(delta(&prev, &cur, CounterWidth::Bits32).unwrap().value, 8);
    }

    #[test]
    fn test_wraparound_64() {
        let prev = CounterSample::new(u64::MAX - 4, at(0));
        let cur = CounterSample::new(3, at(10));
        assert_eq!(delta(&prev, &cur, CounterWidth::Bits64).unwrap().value, 8);
    }

    #[test]
    fn test_unchanged_counter_is_zero_delta() {
        let prev = CounterSample::new(42, at(0));
        let d = delta(&prev, &CounterSample::new(42, at(5)), CounterWidth::Bits64).unwrap();
        assert_eq!(d.value, 0);
    }

    #[test]
    fn test_non_increasing_time_has_no_delta() {
        let prev = CounterSample::new(10, at(10));
        assert!(delta(&prev, &CounterSample::new(20, at(10)), CounterWidth::Bits32).is_none());
        assert!(delta(&prev, &CounterSample::new(20, at(5)), CounterWidth::Bits32).is_none());
    }
}
