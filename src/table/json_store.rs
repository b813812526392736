//! File-backed column store
//!
//! The whole store is one JSON document. Commits write a temp file next to it
//! and rename it into place, so readers see either the old or the new
//! document, never half of a cycle.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::StoreError;
use crate::table::cell::Cell;
use crate::table::store::{
    ColumnStore, CycleCommit, DuplexRow, Parameter, StoreDocument, TableKind, TableRow,
};

pub struct JsonFileStore {
    path: PathBuf,
    doc: StoreDocument,
}

impl JsonFileStore {
    /// Load the document at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(StoreError::Unavailable(format!("{} does not exist", path.display())));
        }
        let text = fs::read_to_string(&path)?;
        let doc = serde_json::from_str(&text)?;
        debug!("Loaded store {}", path.display());
        Ok(Self { path, doc })
    }

    /// Write `doc` to `path`, replacing whatever is there
    pub fn create(path: impl AsRef<Path>, doc: StoreDocument) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            doc,
        };
        store.persist(&store.doc)?;
        Ok(store)
    }

    pub fn document(&self) -> &StoreDocument {
        &self.doc
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), doc)?;
        tmp.as_file_mut().write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl ColumnStore for JsonFileStore {
    fn load_rows(&self, table: TableKind) -> Result<Vec<TableRow>, StoreError> {
        self.doc.load_rows(table)
    }

    fn load_discontinuity_times(&self) -> Result<Vec<(String, Cell)>, StoreError> {
        self.doc.load_discontinuity_times()
    }

    fn load_duplex(&self) -> Result<Vec<DuplexRow>, StoreError> {
        self.doc.load_duplex()
    }

    fn parameter(&self, param: Parameter) -> Result<Cell, StoreError> {
        self.doc.parameter(param)
    }

    fn commit(&mut self, table: TableKind, commit: &CycleCommit) -> Result<(), StoreError> {
        let mut next = self.doc.clone();
        next.commit(table, commit)?;
        self.persist(&next)?;
        self.doc = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::store::RowUpdate;

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonFileStore::open(dir.path().join("nope.json")).err().unwrap();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_commit_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let doc = StoreDocument {
            if_table: vec![TableRow {
                key: "3".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut store = JsonFileStore::create(&path, doc).unwrap();

        let commit = CycleCommit {
            rows: vec![RowUpdate {
                key: "3".into(),
                metrics: None,
                rate_data: "{\"rate\":1.0}".into(),
            }],
            parameters: Vec::new(),
        };
        store.commit(TableKind::Standard, &commit).unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.document(), store.document());
        assert_eq!(
            reopened.document().row(TableKind::Standard, "3").unwrap().rate_data,
            Cell::String("{\"rate\":1.0}".into())
        );
    }
}
