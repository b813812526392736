//! Interface table cycles and the store they run against

pub mod cell;
pub mod json_store;
pub mod processor;
pub mod store;
pub mod timeout;

pub use json_store::JsonFileStore;
pub use processor::{CycleReport, CycleSettings, TableCycleProcessor};
pub use store::{ColumnStore, CycleCommit, Parameter, StoreDocument, TableKind};
pub use timeout::TimeoutProcessor;
