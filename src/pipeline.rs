//! Runs both analysis stages over one series
//!
//! The stages share nothing but the read-only input, so they can run on two
//! threads, and a failure in one never blocks the other's table.

use crate::anomaly::{detect_anomalies, AnomalyConfig, AnomalyFlag};
use crate::data::PriceSeries;
use crate::error::{Error, Result};
use crate::sink::{ResultSink, ANOMALY_TABLE, VOLATILITY_TABLE};
use crate::volatility::{volatility_by_weekday, VolatilityByWeekday};
use std::thread;

/// How the two stages are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One after the other on the calling thread
    Sequential,
    /// Each stage on its own scoped thread
    #[default]
    Concurrent,
}

/// Outcome of one pipeline run, one result per stage
#[derive(Debug)]
pub struct PipelineReport {
    pub volatility: Result<Vec<VolatilityByWeekday>>,
    pub anomalies: Result<Vec<AnomalyFlag>>,
}

/// Outcome of persisting a report, one entry per table
#[derive(Debug, Default)]
pub struct PersistOutcome {
    pub written: Vec<&'static str>,
    pub failed: Vec<(&'static str, Error)>,
}

impl PersistOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl PipelineReport {
    /// Whether both stages produced a table
    pub fn is_complete(&self) -> bool {
        self.volatility.is_ok() && self.anomalies.is_ok()
    }

    /// Write every successful table; stage and sink errors are collected
    /// per table instead of aborting the other write
    pub fn persist(self, sink: &mut dyn ResultSink) -> PersistOutcome {
        let mut outcome = PersistOutcome::default();

        let volatility = self.volatility.and_then(|rows| sink.write_volatility(&rows));
        match volatility {
            Ok(()) => outcome.written.push(VOLATILITY_TABLE),
            Err(e) => outcome.failed.push((VOLATILITY_TABLE, e)),
        }

        let anomalies = self.anomalies.and_then(|flags| sink.write_anomalies(&flags));
        match anomalies {
            Ok(()) => outcome.written.push(ANOMALY_TABLE),
            Err(e) => outcome.failed.push((ANOMALY_TABLE, e)),
        }

        for (table, e) in &outcome.failed {
            log::warn!("{} not written: {}", table, e);
        }
        outcome
    }
}

/// Run the volatility and anomaly stages over the same series
pub fn run_pipeline(series: &PriceSeries, config: &AnomalyConfig, mode: ExecutionMode) -> PipelineReport {
    let (volatility, anomalies) = match mode {
        ExecutionMode::Sequential => (
            volatility_by_weekday(series),
            detect_anomalies(series, config),
        ),
        ExecutionMode::Concurrent => thread::scope(|s| {
            let anomaly_stage = s.spawn(|| detect_anomalies(series, config));
            let volatility = volatility_by_weekday(series);
            let anomalies = anomaly_stage
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
            (volatility, anomalies)
        }),
    };

    if let Err(e) = &volatility {
        log::warn!("Volatility stage failed: {}", e);
    }
    if let Err(e) = &anomalies {
        log::warn!("Anomaly stage failed: {}", e);
    }

    PipelineReport {
        volatility,
        anomalies,
    }
}
