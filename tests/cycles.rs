use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use if_rates::interface::utilization::UNKNOWN;
use if_rates::table::store::{DuplexRow, TableRow};
use if_rates::table::{
    ColumnStore, CycleCommit, CycleSettings, JsonFileStore, Parameter, StoreDocument,
    TableCycleProcessor, TableKind, TimeoutProcessor,
};
use if_rates::StoreError;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
}

fn ifx_row(
    key: &str,
    octets_in: u64,
    octets_out: u64,
    high_speed: u64,
    discontinuity: &str,
) -> TableRow {
    TableRow {
        key: key.into(),
        octets_in: json!(octets_in),
        octets_out: json!(octets_out),
        speed: json!(high_speed),
        discontinuity_time: json!(discontinuity),
        ..Default::default()
    }
}

fn update(store: &mut JsonFileStore, key: &str, octets_in: u64, octets_out: u64) {
    let mut doc = store.document().clone();
    let row = doc.ifx_table.iter_mut().find(|r| r.key == key).unwrap();
    row.octets_in = json!(octets_in);
    row.octets_out = json!(octets_out);
    *store = JsonFileStore::create(store.path().to_path_buf(), doc).unwrap();
}

fn bitrates(store: &JsonFileStore, key: &str) -> (f64, f64, f64) {
    let row = store.document().row(TableKind::HighCapacity, key).unwrap();
    (row.bitrate_in.unwrap(), row.bitrate_out.unwrap(), row.utilization.unwrap())
}

#[test]
fn high_capacity_table_over_several_polls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let doc = StoreDocument {
        ifx_table: vec![
            ifx_row("1", u64::MAX - 999_999, 0, 1_000, "0:00:00.00"),
            ifx_row("2", 0, 0, 10, "0:00:00.00"),
        ],
        dot3_stats_table: vec![
            DuplexRow {
                key: "1".into(),
                duplex_status: json!(3),
            },
            DuplexRow {
                key: "2".into(),
                duplex_status: json!(2),
            },
        ],
        ..Default::default()
    };
    let mut store = JsonFileStore::create(&path, doc).unwrap();
    let processor = TableCycleProcessor::new(TableKind::HighCapacity, CycleSettings::default());

    // Bootstrap
    processor.run(&mut store, at(0)).unwrap();
    assert_eq!(bitrates(&store, "1"), (0.0, 0.0, 0.0));

    // Counter of row 1 wraps: 1_000_000 + 249_000_000 octets in 10s = 200 Mbit/s
    update(&mut store, "1", 249_000_000, 125_000_000);
    update(&mut store, "2", 6_250_000, 6_250_000);
    processor.run(&mut store, at(10)).unwrap();

    let (bin, bout, util) = bitrates(&store, "1");
    assert_eq!(bin, 200_000_000.0);
    assert_eq!(bout, 100_000_000.0);
    assert!((util - 20.0).abs() < 1e-9);

    // Half duplex on a 10 Mbit/s link: 5 + 5 Mbit/s
    let (_, _, util) = bitrates(&store, "2");
    assert!((util - 100.0).abs() < 1e-9);

    // A poll 2s later is too noisy: rates held
    update(&mut store, "1", 999_000_000, 999_000_000);
    processor.run(&mut store, at(12)).unwrap();
    assert_eq!(bitrates(&store, "1").0, 200_000_000.0);

    // Next regular poll measures from the last accepted sample (t=10)
    update(&mut store, "1", 499_000_000, 250_000_000);
    processor.run(&mut store, at(20)).unwrap();
    assert_eq!(bitrates(&store, "1").0, 200_000_000.0);

    // Missed polls for 15 minutes: history discarded
    update(&mut store, "1", 900_000_000, 300_000_000);
    processor.run(&mut store, at(20 + 15 * 60)).unwrap();
    assert_eq!(bitrates(&store, "1").0, 0.0);

    // State survives a reopen of the store (process restart)
    let mut store = JsonFileStore::open(&path).unwrap();
    update(&mut store, "1", 925_000_000, 300_000_000);
    processor.run(&mut store, at(20 + 15 * 60 + 10)).unwrap();
    assert_eq!(bitrates(&store, "1").0, 20_000_000.0);
}

#[test]
fn agent_restart_flag_is_one_shot_for_high_capacity_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let mut doc = StoreDocument {
        ifx_table: vec![ifx_row("1", 0, 0, 1_000, "")],
        ..Default::default()
    };
    doc.set_parameter(Parameter::IfXTableAgentRestartFlag, json!(1));
    let mut store = JsonFileStore::create(&path, doc).unwrap();
    let processor = TableCycleProcessor::new(TableKind::HighCapacity, CycleSettings::default());

    let report = processor.run(&mut store, at(0)).unwrap();
    assert!(report.restart_cleared);
    assert_eq!(store.parameter(Parameter::IfXTableAgentRestartFlag).unwrap(), json!(0));

    update(&mut store, "1", 10_000, 0);
    let report = processor.run(&mut store, at(10)).unwrap();
    assert!(!report.restart_cleared);
    assert_eq!(bitrates(&store, "1").0, 8_000.0);
    // No duplex row for this interface
    assert_eq!(bitrates(&store, "1").2, UNKNOWN);
}

#[test]
fn timeout_cycle_only_touches_rate_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let doc = StoreDocument {
        ifx_table: vec![ifx_row("1", 0, 0, 1_000, "T0")],
        ..Default::default()
    };
    let mut store = JsonFileStore::create(&path, doc).unwrap();
    let settings = CycleSettings::default();

    TableCycleProcessor::new(TableKind::HighCapacity, settings).run(&mut store, at(0)).unwrap();
    let before = store.document().row(TableKind::HighCapacity, "1").unwrap().clone();

    TimeoutProcessor::new(TableKind::HighCapacity, settings).run(&mut store, at(30)).unwrap();
    let after = store.document().row(TableKind::HighCapacity, "1").unwrap();

    // Accurate method: nothing to buffer, the blob is rewritten unchanged
    assert_eq!(after, &before);
}

struct Unavailable;

impl ColumnStore for Unavailable {
    fn load_rows(&self, _: TableKind) -> Result<Vec<TableRow>, StoreError> {
        Err(StoreError::Unavailable("agent unreachable".into()))
    }

    fn load_discontinuity_times(&self) -> Result<Vec<(String, serde_json::Value)>, StoreError> {
        Err(StoreError::Unavailable("agent unreachable".into()))
    }

    fn load_duplex(&self) -> Result<Vec<DuplexRow>, StoreError> {
        Err(StoreError::Unavailable("agent unreachable".into()))
    }

    fn parameter(&self, _: Parameter) -> Result<serde_json::Value, StoreError> {
        Ok(serde_json::Value::Null)
    }

    fn commit(&mut self, _: TableKind, _: &CycleCommit) -> Result<(), StoreError> {
        panic!("nothing may be committed when the store cannot be read");
    }
}

#[test]
fn unavailable_store_fails_the_cycle() {
    let processor = TableCycleProcessor::new(TableKind::Standard, CycleSettings::default());
    let err = processor.run(&mut Unavailable, at(0)).unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));

    let timeout = TimeoutProcessor::new(TableKind::Standard, CycleSettings::default());
    assert!(timeout.run(&mut Unavailable, at(0)).is_err());
}
