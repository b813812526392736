//! Timeout cycle
//!
//! Runs when a poll of the table timed out. Counters are not read and no
//! outputs change; only the rate buffers are fed so the next full cycle
//! measures its delta over the whole gap.

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::error::StoreError;
use crate::rates::DeltaClock;
use crate::table::cell;
use crate::table::processor::{
    encode_rate_data, rate_data_of, read_method, CycleReport, CycleSettings,
};
use crate::table::store::{ColumnStore, CycleCommit, RowUpdate, TableKind};

pub struct TimeoutProcessor {
    table: TableKind,
    settings: CycleSettings,
}

impl TimeoutProcessor {
    pub fn new(table: TableKind, settings: CycleSettings) -> Self {
        Self { table, settings }
    }

    pub fn run<S: ColumnStore + ?Sized>(
        &self,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Result<CycleReport, StoreError> {
        let method = read_method(&*store, self.settings.default_method)?;
        let rows = store.load_rows(self.table)?;
        let clock = DeltaClock::new(method, now);

        let mut commit = CycleCommit::default();
        let mut report = CycleReport {
            table: self.table,
            rows: rows.len(),
            issues: Vec::new(),
            restart_cleared: false,
        };

        for row in &rows {
            let mut issues = Vec::new();
            let mut data = rate_data_of(row, self.table, self.settings.bounds, &mut issues);

            let poll_delta = cell::to_poll_delta(&row.poll_delta);
            data.bitrate_in.buffer_delta(&clock, poll_delta);
            data.bitrate_out.buffer_delta(&clock, poll_delta);

            commit.rows.push(RowUpdate {
                key: row.key.clone(),
                metrics: None,
                rate_data: encode_rate_data(&row.key, &data),
            });

            for issue in issues {
                warn!("{} row {}: {}", self.table.name(), row.key, issue);
                report.issues.push((row.key.clone(), issue));
            }
        }

        store.commit(self.table, &commit)?;
        info!("{} timeout cycle: {} rows buffered", self.table.name(), report.rows);
        Ok(report)
    }
}
