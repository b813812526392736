//! Full polling cycle over one interface table
//!
//! Per row: discontinuity check, octet rates for both directions, bit rates,
//! utilization. Rows are independent; a row that cannot be read cleanly is
//! repaired with safe defaults and reported, never allowed to stop the cycle.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde_json::json;

use crate::error::{RowIssue, StoreError};
use crate::interface::utilization::{self, UNKNOWN};
use crate::interface::{DiscontinuityDetector, DuplexStatus, InterfaceRateData};
use crate::rates::{DeltaClock, RateBounds, RateEstimator, RateMethod};
use crate::table::cell::{self, Cell};
use crate::table::store::{
    ColumnStore, CycleCommit, Parameter, RowMetrics, RowUpdate, TableKind, TableRow,
};

/// Knobs shared by full and timeout cycles
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CycleSettings {
    pub bounds: RateBounds,
    /// Used when the store does not specify a rate calculation method
    pub default_method: RateMethod,
}

/// What a cycle did, for logging and for the caller
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub table: TableKind,
    pub rows: usize,
    /// Recovered per-row problems, keyed by interface
    pub issues: Vec<(String, RowIssue)>,
    pub restart_cleared: bool,
}

/// Everything a full cycle reads from the store
#[derive(Debug, Clone, Default)]
pub struct CycleInput {
    pub rows: Vec<TableRow>,
    /// Side-table discontinuity times joined by key (standard table only)
    pub discontinuities: HashMap<String, Cell>,
    pub duplex: HashMap<String, DuplexStatus>,
    pub agent_restarted: bool,
    pub method: RateMethod,
}

pub(crate) fn read_method<S: ColumnStore + ?Sized>(
    store: &S,
    default: RateMethod,
) -> Result<RateMethod, StoreError> {
    let cell = store.parameter(Parameter::RateCalculationMethod)?;
    Ok(cell::to_rate_method(&cell).unwrap_or(default))
}

/// Rate data of a row; malformed blobs fall back to no history.
pub(crate) fn rate_data_of(
    row: &TableRow,
    table: TableKind,
    bounds: RateBounds,
    issues: &mut Vec<RowIssue>,
) -> InterfaceRateData {
    let width = table.width();
    let parsed = cell::to_rate_blob(&row.rate_data)
        .and_then(|text| InterfaceRateData::from_json(&text, width, bounds));
    match parsed {
        Ok(data) => data,
        Err(issue) => {
            issues.push(issue);
            InterfaceRateData::new(width, bounds)
        }
    }
}

pub(crate) fn encode_rate_data(key: &str, data: &InterfaceRateData) -> String {
    match data.to_json() {
        Ok(text) => text,
        Err(e) => {
            warn!("Cannot encode rate data for {}: {}", key, e);
            String::new()
        }
    }
}

pub struct TableCycleProcessor {
    table: TableKind,
    settings: CycleSettings,
}

impl TableCycleProcessor {
    pub fn new(table: TableKind, settings: CycleSettings) -> Self {
        Self { table, settings }
    }

    /// Load, process and commit one cycle
    pub fn run<S: ColumnStore + ?Sized>(
        &self,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Result<CycleReport, StoreError> {
        let input = self.load(&*store)?;
        let (commit, report) = self.process(&input, now);
        store.commit(self.table, &commit)?;

        info!(
            "{} cycle: {} rows, {} recovered issues{}",
            self.table.name(),
            report.rows,
            report.issues.len(),
            if report.restart_cleared { ", agent restart handled" } else { "" }
        );
        Ok(report)
    }

    pub fn load<S: ColumnStore + ?Sized>(&self, store: &S) -> Result<CycleInput, StoreError> {
        let agent_restarted = cell::to_flag(&store.parameter(self.table.restart_flag())?);
        let method = read_method(store, self.settings.default_method)?;
        let rows = store.load_rows(self.table)?;

        // ifTable has no discontinuity column; borrow ifXTable's
        let discontinuities = match self.table {
            TableKind::Standard => store.load_discontinuity_times()?.into_iter().collect(),
            TableKind::HighCapacity => HashMap::new(),
        };

        let duplex = store
            .load_duplex()?
            .into_iter()
            .map(|row| {
                let status = cell::to_duplex(&row.duplex_status);
                (row.key, status)
            })
            .collect();

        Ok(CycleInput {
            rows,
            discontinuities,
            duplex,
            agent_restarted,
            method,
        })
    }

    /// Compute the cycle's writes. Deterministic for a given input and `now`.
    pub fn process(&self, input: &CycleInput, now: DateTime<Utc>) -> (CycleCommit, CycleReport) {
        let clock = DeltaClock::new(input.method, now);
        let detector = DiscontinuityDetector::new(input.agent_restarted);

        let mut commit = CycleCommit::default();
        let mut report = CycleReport {
            table: self.table,
            rows: input.rows.len(),
            issues: Vec::new(),
            restart_cleared: false,
        };

        for row in &input.rows {
            let mut issues = Vec::new();
            commit.rows.push(self.process_row(row, input, &clock, &detector, &mut issues));

            for issue in issues {
                warn!("{} row {}: {}", self.table.name(), row.key, issue);
                report.issues.push((row.key.clone(), issue));
            }
        }

        if input.agent_restarted {
            commit.parameters.push((self.table.restart_flag(), json!(0)));
            report.restart_cleared = true;
        }

        (commit, report)
    }

    fn process_row(
        &self,
        row: &TableRow,
        input: &CycleInput,
        clock: &DeltaClock,
        detector: &DiscontinuityDetector,
        issues: &mut Vec<RowIssue>,
    ) -> RowUpdate {
        let mut data = rate_data_of(row, self.table, self.settings.bounds, issues);

        // Discontinuity
        let fresh = match self.table {
            TableKind::HighCapacity => cell::to_text(&row.discontinuity_time),
            TableKind::Standard => input.discontinuities.get(&row.key).and_then(cell::to_text),
        };
        if detector.check(&row.key, &mut data.discontinuity_time, fresh.as_deref()) {
            data.reset_rates();
        }

        // Rates
        let poll_delta = cell::to_poll_delta(&row.poll_delta);
        let octets_in = self.counter(&row.octets_in, "octets_in", issues);
        let octets_out = self.counter(&row.octets_out, "octets_out", issues);
        let rate_in = octet_rate(&mut data.bitrate_in, clock, octets_in, poll_delta);
        let rate_out = octet_rate(&mut data.bitrate_out, clock, octets_out, poll_delta);
        let bitrate_in = utilization::octets_to_bits(rate_in);
        let bitrate_out = utilization::octets_to_bits(rate_out);

        // Utilization
        let speed = self.link_speed(&row.speed, issues);
        let duplex = input.duplex.get(&row.key).copied().unwrap_or_default();
        let utilization =
            utilization::utilization(bitrate_in, bitrate_out, speed, duplex).unwrap_or(UNKNOWN);

        debug!(
            "{} row {}: in {:.0} bit/s, out {:.0} bit/s, utilization {:.2}%",
            self.table.name(),
            row.key,
            bitrate_in,
            bitrate_out,
            utilization
        );

        RowUpdate {
            key: row.key.clone(),
            metrics: Some(RowMetrics {
                bitrate_in,
                bitrate_out,
                utilization,
            }),
            rate_data: encode_rate_data(&row.key, &data),
        }
    }

    /// Counter value, or `None` after recording why the cell is unusable
    fn counter(&self, cell: &Cell, field: &'static str, issues: &mut Vec<RowIssue>) -> Option<u64> {
        match cell::to_unsigned(cell, self.table.width().max_value(), field) {
            Ok(value) => Some(value),
            Err(issue) => {
                issues.push(issue);
                None
            }
        }
    }

    fn link_speed(&self, cell: &Cell, issues: &mut Vec<RowIssue>) -> Option<f64> {
        // Both ifSpeed and ifHighSpeed are Gauge32
        let raw = match cell::to_unsigned(cell, u32::MAX as u64, "speed") {
            Ok(raw) => raw,
            Err(issue) => {
                issues.push(issue);
                return None;
            }
        };
        match self.table {
            TableKind::Standard => utilization::standard_speed(raw),
            TableKind::HighCapacity => utilization::high_capacity_speed(raw),
        }
    }
}

/// Octet rate for one direction. An unreadable counter must not become the
/// baseline, so the estimator holds its last rate instead.
fn octet_rate(
    estimator: &mut RateEstimator,
    clock: &DeltaClock,
    value: Option<u64>,
    poll_delta: Option<Duration>,
) -> f64 {
    match value {
        Some(value) => estimator.calculate(clock, value, poll_delta),
        None => estimator.hold(clock, poll_delta),
    }
}
