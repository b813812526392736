//! Per-interface persisted rate data
//!
//! One JSON blob per table row: the last discontinuity marker seen for the
//! interface and the estimator state for each direction.

use serde::{Deserialize, Serialize};

use crate::error::RowIssue;
use crate::rates::{CounterWidth, RateBounds, RateEstimator, RateState};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Persisted {
    discontinuity_time: String,
    bitrate_in: RateState,
    bitrate_out: RateState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceRateData {
    pub discontinuity_time: String,
    pub bitrate_in: RateEstimator,
    pub bitrate_out: RateEstimator,
}

impl InterfaceRateData {
    pub fn new(width: CounterWidth, bounds: RateBounds) -> Self {
        Self {
            discontinuity_time: String::new(),
            bitrate_in: RateEstimator::new(width, bounds),
            bitrate_out: RateEstimator::new(width, bounds),
        }
    }

    /// Parse a stored blob; empty input means no history.
    pub fn from_json(
        text: &str,
        width: CounterWidth,
        bounds: RateBounds,
    ) -> Result<Self, RowIssue> {
        if text.trim().is_empty() {
            return Ok(Self::new(width, bounds));
        }

        let persisted: Persisted =
            serde_json::from_str(text).map_err(|e| RowIssue::MalformedPersistedState {
                reason: e.to_string(),
            })?;

        Ok(Self {
            discontinuity_time: persisted.discontinuity_time,
            bitrate_in: RateEstimator::with_state(width, bounds, persisted.bitrate_in),
            bitrate_out: RateEstimator::with_state(width, bounds, persisted.bitrate_out),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&Persisted {
            discontinuity_time: self.discontinuity_time.clone(),
            bitrate_in: self.bitrate_in.state().clone(),
            bitrate_out: self.bitrate_out.state().clone(),
        })
    }

    /// Discard the history of both directions. The marker is kept.
    pub fn reset_rates(&mut self) {
        self.bitrate_in.reset();
        self.bitrate_out.reset();
    }
}
