//! Coercion of raw store cells
//!
//! The store hands back loosely typed JSON values. Counters and speeds may
//! arrive as numbers or numeric strings; anything that cannot be read as a
//! number in range is a `ConversionFailure` for that field only.

use chrono::Duration;
use serde_json::Value;

use crate::error::RowIssue;
use crate::interface::DuplexStatus;
use crate::rates::RateMethod;

pub type Cell = Value;

fn failure(field: &'static str, cell: &Cell) -> RowIssue {
    RowIssue::ConversionFailure {
        field,
        value: cell.to_string(),
    }
}

fn as_f64(cell: &Cell) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(u8::from(*b) as f64),
        _ => None,
    }
}

/// Unsigned value saturated into `[0, max]`.
///
/// Integers are read exactly so 64-bit counters keep full precision.
pub fn to_unsigned(cell: &Cell, max: u64, field: &'static str) -> Result<u64, RowIssue> {
    let exact = match cell {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    if let Some(v) = exact {
        return Ok(v.min(max));
    }

    match as_f64(cell) {
        Some(f) if f.is_nan() => Err(failure(field, cell)),
        Some(f) if f <= 0.0 => Ok(0),
        Some(f) if f >= max as f64 => Ok(max),
        Some(f) => Ok(f.round() as u64),
        None => Err(failure(field, cell)),
    }
}

/// Textual form of a scalar cell; `None` for null and non-scalars.
pub fn to_text(cell: &Cell) -> Option<String> {
    match cell {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Persisted rate blob; null means nothing stored yet.
pub fn to_rate_blob(cell: &Cell) -> Result<String, RowIssue> {
    match cell {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        other => Err(RowIssue::MalformedPersistedState {
            reason: format!("expected a string, got {}", other),
        }),
    }
}

/// Boolean parameter; anything unreadable is false.
pub fn to_flag(cell: &Cell) -> bool {
    match cell {
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => true,
        other => as_f64(other).is_some_and(|f| f != 0.0),
    }
}

pub fn to_duplex(cell: &Cell) -> DuplexStatus {
    as_f64(cell)
        .filter(|f| f.fract() == 0.0)
        .map(|f| DuplexStatus::from_code(f as i64))
        .unwrap_or_default()
}

/// Poller-reported elapsed time in milliseconds
pub fn to_poll_delta(cell: &Cell) -> Option<Duration> {
    as_f64(cell)
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|ms| Duration::milliseconds(ms.round() as i64))
}

/// Rate calculation method parameter: 1/"fast" or 2/"accurate"
pub fn to_rate_method(cell: &Cell) -> Option<RateMethod> {
    if let Value::String(s) = cell {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => return Some(RateMethod::Fast),
            "accurate" => return Some(RateMethod::Accurate),
            _ => {}
        }
    }
    match as_f64(cell) {
        Some(f) if f == 1.0 => Some(RateMethod::Fast),
        Some(f) if f == 2.0 => Some(RateMethod::Accurate),
        _ => None,
    }
}
