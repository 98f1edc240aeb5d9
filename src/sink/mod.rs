//! Result sinks for the two output tables
//!
//! Every write replaces the previous table of the same name; nothing is
//! appended across runs.

mod csv_dir;
mod memory;

pub use csv_dir::*;
pub use memory::*;

use crate::anomaly::AnomalyFlag;
use crate::error::Result;
use crate::volatility::VolatilityByWeekday;

/// Table name for weekday volatility rows
pub const VOLATILITY_TABLE: &str = "volatility_by_day";
/// Table name for flagged timestamps
pub const ANOMALY_TABLE: &str = "detected_anomalies";

/// Destination for the pipeline outputs
pub trait ResultSink {
    /// Replace the `volatility_by_day` table
    fn write_volatility(&mut self, rows: &[VolatilityByWeekday]) -> Result<()>;

    /// Replace the `detected_anomalies` table
    fn write_anomalies(&mut self, flags: &[AnomalyFlag]) -> Result<()>;
}
