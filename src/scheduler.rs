//! Polling scheduler
//!
//! Runs a full cycle for every enabled table on a fixed tick. A failed cycle
//! produces no output for that poll; the next tick starts from whatever was
//! last committed.

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use tokio::time;

use crate::config::Config;
use crate::table::{CycleReport, JsonFileStore, TableCycleProcessor, TableKind, TimeoutProcessor};

/// Kind of cycle to run against a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    Full,
    Timeout,
}

/// Run one cycle of `kind` over `table` against the configured store
pub fn run_once(config: &Config, table: TableKind, kind: CycleKind) -> Result<CycleReport> {
    let mut store = JsonFileStore::open(&config.store_path)
        .with_context(|| format!("Failed to open store {}", config.store_path.display()))?;
    let settings = config.cycle_settings();
    let now = Utc::now();

    let report = match kind {
        CycleKind::Full => TableCycleProcessor::new(table, settings).run(&mut store, now),
        CycleKind::Timeout => TimeoutProcessor::new(table, settings).run(&mut store, now),
    }
    .with_context(|| format!("{} cycle failed", table.name()))?;

    Ok(report)
}

pub struct Scheduler {
    config: Config,
}

impl Scheduler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Tick until Ctrl-C
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Scheduler starting (interval: {:?}, store: {})",
            self.config.poll_interval,
            self.config.store_path.display()
        );

        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let reports = self.tick();
                    if reports.is_empty() && !self.config.enabled_tables().is_empty() {
                        warn!("No table completed this tick; retrying next interval");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Scheduler stopping");
                    return Ok(());
                }
            }
        }
    }

    /// One full cycle per enabled table. Failures are logged, not returned.
    pub fn tick(&mut self) -> Vec<CycleReport> {
        let mut reports = Vec::new();
        for table in self.config.enabled_tables() {
            match run_once(&self.config, table, CycleKind::Full) {
                Ok(report) => reports.push(report),
                Err(e) => warn!("{:#}", e),
            }
        }
        reports
    }
}
