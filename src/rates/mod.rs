//! Counter deltas and rate estimation

pub mod counter;
pub mod estimator;

pub use counter::{CounterSample, CounterWidth, Delta};
pub use estimator::{DeltaClock, RateBounds, RateEstimator, RateMethod, RateOutcome, RateState};
