//! if-rates: bitrate and utilization for SNMP interface tables
//!
//! Each polling cycle turns the cumulative octet counters of ifTable (32-bit)
//! and ifXTable (64-bit) into per-interface bit rates and bandwidth
//! utilization, carrying per-row rate state between cycles in the table
//! itself.

pub mod config;
pub mod error;
pub mod interface;
pub mod rates;
pub mod scheduler;
pub mod table;

pub use error::{RowIssue, StoreError};
