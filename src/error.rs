//! Error taxonomy
//!
//! `StoreError` is the only error that escapes a cycle. Everything that goes
//! wrong inside a single row is a `RowIssue`: it is logged, recorded in the
//! cycle report and recovered from locally.

use thiserror::Error;

/// Failure at the column store boundary. Fatal for the current cycle.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A problem confined to one row of one cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowIssue {
    #[error("Malformed persisted rate state: {reason}")]
    MalformedPersistedState { reason: String },
    #[error("Cannot convert {field} value {value}")]
    ConversionFailure { field: &'static str, value: String },
}
