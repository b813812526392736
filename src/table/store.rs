//! Column store boundary
//!
//! Everything a cycle reads or writes goes through `ColumnStore`. Reads return
//! raw cells; writes are one typed batch per cycle so no partial update is
//! ever visible.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::rates::CounterWidth;
use crate::table::cell::Cell;

/// Which interface table a cycle runs over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum TableKind {
    /// ifTable, 32-bit counters, ifSpeed in bits/s
    Standard,
    /// ifXTable, 64-bit counters, ifHighSpeed in Mbit/s
    HighCapacity,
}

impl TableKind {
    pub fn name(self) -> &'static str {
        match self {
            TableKind::Standard => "ifTable",
            TableKind::HighCapacity => "ifXTable",
        }
    }

    pub fn width(self) -> CounterWidth {
        match self {
            TableKind::Standard => CounterWidth::Bits32,
            TableKind::HighCapacity => CounterWidth::Bits64,
        }
    }

    pub fn restart_flag(self) -> Parameter {
        match self {
            TableKind::Standard => Parameter::IfTableAgentRestartFlag,
            TableKind::HighCapacity => Parameter::IfXTableAgentRestartFlag,
        }
    }
}

/// Standalone (non-table) parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    IfTableAgentRestartFlag,
    IfXTableAgentRestartFlag,
    RateCalculationMethod,
}

impl Parameter {
    pub fn name(self) -> &'static str {
        match self {
            Parameter::IfTableAgentRestartFlag => "iftable_snmp_agent_restart_flag",
            Parameter::IfXTableAgentRestartFlag => "ifxtable_snmp_agent_restart_flag",
            Parameter::RateCalculationMethod => "interfaces_rate_calculation_method",
        }
    }
}

/// One row of ifTable or ifXTable, inputs and outputs alike
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub key: String,
    #[serde(default)]
    pub octets_in: Cell,
    #[serde(default)]
    pub octets_out: Cell,
    #[serde(default)]
    pub speed: Cell,
    /// ifCounterDiscontinuityTime (ifXTable only)
    #[serde(default)]
    pub discontinuity_time: Cell,
    /// Milliseconds since the poller last polled this row
    #[serde(default)]
    pub poll_delta: Cell,
    #[serde(default)]
    pub rate_data: Cell,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate_in: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate_out: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilization: Option<f64>,
}

/// Row of dot3StatsTable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplexRow {
    pub key: String,
    #[serde(default)]
    pub duplex_status: Cell,
}

/// Outputs of a full cycle for one row. Unknown values are `-1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMetrics {
    pub bitrate_in: f64,
    pub bitrate_out: f64,
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowUpdate {
    pub key: String,
    /// `None` for timeout cycles, which only refresh rate data
    pub metrics: Option<RowMetrics>,
    pub rate_data: String,
}

/// Everything one cycle writes back
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleCommit {
    pub rows: Vec<RowUpdate>,
    pub parameters: Vec<(Parameter, Cell)>,
}

impl CycleCommit {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.parameters.is_empty()
    }
}

pub trait ColumnStore {
    /// All rows of `table`, in table order
    fn load_rows(&self, table: TableKind) -> Result<Vec<TableRow>, StoreError>;

    /// (key, ifCounterDiscontinuityTime) pairs from ifXTable
    fn load_discontinuity_times(&self) -> Result<Vec<(String, Cell)>, StoreError>;

    fn load_duplex(&self) -> Result<Vec<DuplexRow>, StoreError>;

    /// Current value of a parameter; null when never set
    fn parameter(&self, param: Parameter) -> Result<Cell, StoreError>;

    /// Apply a cycle's writes as one batch
    fn commit(&mut self, table: TableKind, commit: &CycleCommit) -> Result<(), StoreError>;
}

/// In-memory store; also the on-disk document of `JsonFileStore`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub parameters: BTreeMap<String, Cell>,
    #[serde(default)]
    pub if_table: Vec<TableRow>,
    #[serde(default)]
    pub ifx_table: Vec<TableRow>,
    #[serde(default)]
    pub dot3_stats_table: Vec<DuplexRow>,
}

impl StoreDocument {
    pub fn rows(&self, table: TableKind) -> &[TableRow] {
        match table {
            TableKind::Standard => &self.if_table,
            TableKind::HighCapacity => &self.ifx_table,
        }
    }

    fn rows_mut(&mut self, table: TableKind) -> &mut Vec<TableRow> {
        match table {
            TableKind::Standard => &mut self.if_table,
            TableKind::HighCapacity => &mut self.ifx_table,
        }
    }

    pub fn row(&self, table: TableKind, key: &str) -> Option<&TableRow> {
        self.rows(table).iter().find(|r| r.key == key)
    }

    pub fn set_parameter(&mut self, param: Parameter, value: Cell) {
        self.parameters.insert(param.name().to_string(), value);
    }
}

impl ColumnStore for StoreDocument {
    fn load_rows(&self, table: TableKind) -> Result<Vec<TableRow>, StoreError> {
        Ok(self.rows(table).to_vec())
    }

    fn load_discontinuity_times(&self) -> Result<Vec<(String, Cell)>, StoreError> {
        Ok(self
            .ifx_table
            .iter()
            .map(|r| (r.key.clone(), r.discontinuity_time.clone()))
            .collect())
    }

    fn load_duplex(&self) -> Result<Vec<DuplexRow>, StoreError> {
        Ok(self.dot3_stats_table.clone())
    }

    fn parameter(&self, param: Parameter) -> Result<Cell, StoreError> {
        Ok(self.parameters.get(param.name()).cloned().unwrap_or_default())
    }

    fn commit(&mut self, table: TableKind, commit: &CycleCommit) -> Result<(), StoreError> {
        let rows = self.rows_mut(table);
        for update in &commit.rows {
            let Some(row) = rows.iter_mut().find(|r| r.key == update.key) else {
                debug!("{}: row {} vanished before commit, skipped", table.name(), update.key);
                continue;
            };
            row.rate_data = Cell::String(update.rate_data.clone());
            if let Some(metrics) = update.metrics {
                row.bitrate_in = Some(metrics.bitrate_in);
                row.bitrate_out = Some(metrics.bitrate_out);
                row.utilization = Some(metrics.utilization);
            }
        }

        for (param, value) in &commit.parameters {
            self.set_parameter(*param, value.clone());
        }
        Ok(())
    }
}
