//! Price/volume shock features
//!
//! Each record after the first is described by how far its close and its
//! volume moved from the previous record.

use crate::data::PriceSeries;
use chrono::{DateTime, Utc};
use ndarray::Array2;

/// Feature names, in column order of [`FeatureMatrix::data`]
pub const FEATURE_NAMES: [&str; 2] = ["abs_price_delta", "abs_volume_delta"];

/// Absolute deltas against the previous record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRecord {
    pub timestamp: DateTime<Utc>,
    pub abs_price_delta: f64,
    pub abs_volume_delta: f64,
}

/// Derive one feature record per consecutive pair; the first record is dropped
pub fn derive_features(series: &PriceSeries) -> Vec<FeatureRecord> {
    series
        .data
        .windows(2)
        .map(|w| FeatureRecord {
            timestamp: w[1].timestamp,
            abs_price_delta: (w[1].close - w[0].close).abs(),
            abs_volume_delta: (w[1].volume - w[0].volume).abs(),
        })
        .collect()
}

/// Feature records laid out as a dense matrix for the detector
#[derive(Clone, Debug)]
pub struct FeatureMatrix {
    /// Row timestamps
    pub timestamps: Vec<DateTime<Utc>>,
    /// Feature matrix (rows = time, columns = features)
    pub data: Array2<f64>,
}

impl FeatureMatrix {
    /// Build from derived feature records
    pub fn from_records(records: &[FeatureRecord]) -> Self {
        let data = Array2::from_shape_fn((records.len(), FEATURE_NAMES.len()), |(i, j)| {
            match j {
                0 => records[i].abs_price_delta,
                _ => records[i].abs_volume_delta,
            }
        });

        Self {
            timestamps: records.iter().map(|r| r.timestamp).collect(),
            data,
        }
    }

    /// Get the number of time points
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawRecord;

    fn sample() -> PriceSeries {
        PriceSeries::with_data(vec![
            RawRecord::from_epoch_seconds(0, 100.0, 10.0).unwrap(),
            RawRecord::from_epoch_seconds(60, 95.0, 14.0).unwrap(),
            RawRecord::from_epoch_seconds(120, 97.5, 4.0).unwrap(),
        ])
    }

    #[test]
    fn test_deltas_are_absolute() {
        let features = derive_features(&sample());

        assert_eq!(features.len(), 2);
        assert_eq!(features[0].timestamp.timestamp(), 60);
        assert!((features[0].abs_price_delta - 5.0).abs() < 1e-10);
        assert!((features[0].abs_volume_delta - 4.0).abs() < 1e-10);
        assert!((features[1].abs_price_delta - 2.5).abs() < 1e-10);
        assert!((features[1].abs_volume_delta - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_matrix_layout() {
        let matrix = FeatureMatrix::from_records(&derive_features(&sample()));

        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.data.ncols(), FEATURE_NAMES.len());
        assert_eq!(matrix.data.column(0).to_vec(), vec![5.0, 2.5]);
        assert_eq!(matrix.data.column(1).to_vec(), vec![4.0, 10.0]);
        assert_eq!(matrix.timestamps[1].timestamp(), 120);
    }
}
