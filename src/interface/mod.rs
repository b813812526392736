//! Per-interface logic: discontinuities, persisted rate data, utilization

pub mod discontinuity;
pub mod rate_data;
pub mod utilization;

pub use discontinuity::DiscontinuityDetector;
pub use rate_data::InterfaceRateData;
pub use utilization::DuplexStatus;
