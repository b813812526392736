//! Octet rate estimation with persisted history
//!
//! A `RateEstimator` keeps the last accepted sample of one counter and turns
//! the next sample into an octets-per-second rate, subject to a minimum and
//! maximum acceptance window on the elapsed time. Its state round-trips
//! through JSON so rates stay continuous across polling cycles and restarts.

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::RowIssue;
use crate::rates::counter::{self, CounterSample, CounterWidth};

/// How the elapsed time between two polls of a row is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateMethod {
    /// Wall-clock timestamps taken when each cycle runs
    #[default]
    Accurate,
    /// Elapsed time reported by the poller per row, plus time buffered by
    /// timeout cycles
    Fast,
}

/// Resolves the timestamp of the sample being fed in this cycle.
#[derive(Debug, Clone, Copy)]
pub struct DeltaClock {
    method: RateMethod,
    now: DateTime<Utc>,
}

impl DeltaClock {
    pub fn new(method: RateMethod, now: DateTime<Utc>) -> Self {
        Self { method, now }
    }

    pub fn method(&self) -> RateMethod {
        self.method
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn sample_time(&self, state: &RateState, poll_delta: Option<Duration>) -> DateTime<Utc> {
        match (self.method, state.last, poll_delta) {
            (RateMethod::Fast, Some(last), Some(elapsed)) => {
                last.timestamp + Duration::milliseconds(state.buffered_ms as i64) + elapsed
            }
            _ => self.now,
        }
    }
}

/// Acceptance window for the time between two samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateBounds {
    pub min_delta: Duration,
    pub max_delta: Duration,
}

impl RateBounds {
    pub fn new(min_delta: std::time::Duration, max_delta: std::time::Duration) -> Self {
        Self {
            min_delta: Duration::milliseconds(min_delta.as_millis() as i64),
            max_delta: Duration::milliseconds(max_delta.as_millis() as i64),
        }
    }
}

impl Default for RateBounds {
    fn default() -> Self {
        Self {
            min_delta: Duration::seconds(5),
            max_delta: Duration::minutes(10),
        }
    }
}

/// Persisted part of an estimator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateState {
    /// Last accepted sample (the baseline for the next delta)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<CounterSample>,
    /// Last computed octet rate, reused while deltas are too short
    pub rate: f64,
    /// Elapsed time reported by timeout cycles since `last` (fast method)
    pub buffered_ms: u64,
}

/// What a single `evaluate` call did with the sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateOutcome {
    /// No history yet; the sample became the baseline
    Bootstrap,
    /// Elapsed time was not positive; the sample became the baseline
    NoElapsedTime,
    /// Elapsed time below the minimum; previous rate reused, history kept
    TooFast(f64),
    /// Elapsed time above the maximum; history discarded, sample is the new baseline
    TooStale,
    /// Rate computed from the delta; sample is the new baseline
    Computed(f64),
}

impl RateOutcome {
    pub fn rate(&self) -> f64 {
        match *self {
            RateOutcome::TooFast(rate) | RateOutcome::Computed(rate) => rate,
            RateOutcome::Bootstrap | RateOutcome::NoElapsedTime | RateOutcome::TooStale => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateEstimator {
    width: CounterWidth,
    bounds: RateBounds,
    state: RateState,
}

impl RateEstimator {
    /// Estimator without history
    pub fn new(width: CounterWidth, bounds: RateBounds) -> Self {
        Self::with_state(width, bounds, RateState::default())
    }

    pub fn with_state(width: CounterWidth, bounds: RateBounds, state: RateState) -> Self {
        Self { width, bounds, state }
    }

    /// Restore an estimator from its persisted form.
    ///
    /// Empty or blank input yields a fresh estimator.
    pub fn from_json(
        text: &str,
        width: CounterWidth,
        bounds: RateBounds,
    ) -> Result<Self, RowIssue> {
        if text.trim().is_empty() {
            return Ok(Self::new(width, bounds));
        }
        let state = serde_json::from_str(text).map_err(|e| RowIssue::MalformedPersistedState {
            reason: e.to_string(),
        })?;
        Ok(Self::with_state(width, bounds, state))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.state)
    }

    pub fn state(&self) -> &RateState {
        &self.state
    }

    pub fn width(&self) -> CounterWidth {
        self.width
    }

    /// Drop all history, as if deserialized from an empty string
    pub fn reset(&mut self) {
        self.state = RateState::default();
    }

    /// Octets per second for the counter reaching `value` in this cycle
    pub fn calculate(
        &mut self,
        clock: &DeltaClock,
        value: u64,
        poll_delta: Option<Duration>,
    ) -> f64 {
        self.evaluate(clock, value, poll_delta).rate()
    }

    pub fn evaluate(
        &mut self,
        clock: &DeltaClock,
        value: u64,
        poll_delta: Option<Duration>,
    ) -> RateOutcome {
        let current = CounterSample::new(value, clock.sample_time(&self.state, poll_delta));

        // 1. First observation
        let Some(previous) = self.state.last else {
            self.rebaseline(current);
            return RateOutcome::Bootstrap;
        };

        // 2. Wraparound-corrected delta
        let Some(delta) = counter::delta(&previous, &current, self.width) else {
            debug!(
                "Rate: sample at {} not after baseline {}, rebaselining",
                current.timestamp, previous.timestamp
            );
            self.rebaseline(current);
            return RateOutcome::NoElapsedTime;
        };

        // 3. Too close to the baseline: keep history and the last rate. In fast
        // mode the sample time is rebuilt from the baseline every cycle, so the
        // elapsed time of this poll must be carried into the next one.
        if delta.time < self.bounds.min_delta {
            if clock.method() == RateMethod::Fast {
                self.buffer(poll_delta);
            }
            return RateOutcome::TooFast(self.state.rate);
        }

        // 4. Too far from the baseline: start over
        if delta.time > self.bounds.max_delta {
            debug!(
                "Rate: delta of {}s exceeds maximum, history discarded",
                delta.time.num_seconds()
            );
            self.rebaseline(current);
            return RateOutcome::TooStale;
        }

        // 5. Accept
        let rate = delta.value as f64 / delta.seconds();
        self.state = RateState {
            last: Some(current),
            rate,
            buffered_ms: 0,
        };
        RateOutcome::Computed(rate)
    }

    /// Feed elapsed time into history without producing a rate.
    ///
    /// Only the fast method tracks elapsed time per row; with wall-clock
    /// timestamps the next sample already spans the gap.
    pub fn buffer_delta(&mut self, clock: &DeltaClock, poll_delta: Option<Duration>) {
        if clock.method() != RateMethod::Fast || self.state.last.is_none() {
            return;
        }
        self.buffer(poll_delta);
    }

    /// Hold the current rate and history for a cycle whose sample is unusable.
    ///
    /// Returns the last computed rate; in fast mode the elapsed time is still
    /// buffered so the next good sample spans the whole gap.
    pub fn hold(&mut self, clock: &DeltaClock, poll_delta: Option<Duration>) -> f64 {
        self.buffer_delta(clock, poll_delta);
        self.state.rate
    }

    fn buffer(&mut self, poll_delta: Option<Duration>) {
        if let Some(elapsed) = poll_delta {
            let ms = elapsed.num_milliseconds().max(0) as u64;
            self.state.buffered_ms = self.state.buffered_ms.saturating_add(ms);
        }
    }

    fn rebaseline(&mut self, sample: CounterSample) {
        self.state = RateState {
            last: Some(sample),
            rate: 0.0,
            buffered_ms: 0,
        };
    }
}
