//! Joint price/volume anomaly detection
//!
//! Feature records (absolute close and volume deltas) are scored by an
//! isolation forest; the rarest fraction of the population is flagged.
//!
//! - `config`: detector parameters and their validation
//! - `isolation_forest`: the randomized partition-tree ensemble
//! - `detector`: series in, flagged timestamps out

mod config;
mod detector;
mod isolation_forest;

pub use config::*;
pub use detector::*;
pub use isolation_forest::*;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One row of the `detected_anomalies` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnomalyFlag {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

/// Result of anomaly detection
#[derive(Debug, Clone)]
pub struct AnomalyResult {
    /// Binary flags indicating anomalies
    pub is_anomaly: Vec<bool>,
    /// Continuous anomaly scores (higher = more anomalous)
    pub scores: Vec<f64>,
    /// Score a sample must reach to be flagged
    pub threshold: f64,
}

impl AnomalyResult {
    /// Create a new anomaly result
    pub fn new(is_anomaly: Vec<bool>, scores: Vec<f64>, threshold: f64) -> Self {
        Self {
            is_anomaly,
            scores,
            threshold,
        }
    }

    /// Get indices of anomalies
    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.is_anomaly
            .iter()
            .enumerate()
            .filter_map(|(i, &is_anom)| if is_anom { Some(i) } else { None })
            .collect()
    }

    /// Get the number of detected anomalies
    pub fn anomaly_count(&self) -> usize {
        self.is_anomaly.iter().filter(|&&x| x).count()
    }

    /// Get the anomaly rate
    pub fn anomaly_rate(&self) -> f64 {
        if self.is_anomaly.is_empty() {
            0.0
        } else {
            self.anomaly_count() as f64 / self.is_anomaly.len() as f64
        }
    }
}

/// Trait for multivariate anomaly detectors
pub trait MultivariateDetector {
    /// Fit the detector to training data
    fn fit(&mut self, data: &Array2<f64>) -> Result<()>;

    /// Detect anomalies in the given data
    fn detect(&self, data: &Array2<f64>) -> AnomalyResult;

    /// Fit on a population and label that same population
    fn fit_detect(&mut self, data: &Array2<f64>) -> Result<AnomalyResult> {
        self.fit(data)?;
        Ok(self.detect(data))
    }
}
