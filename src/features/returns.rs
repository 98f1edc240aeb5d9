//! Close-to-close simple returns

use crate::data::PriceSeries;
use chrono::{DateTime, Utc};

/// Return realised over the period ending at `period_start`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnPoint {
    pub period_start: DateTime<Utc>,
    pub ret: f64,
}

/// Simple returns keyed by the timestamp of the later record of each pair
#[derive(Debug, Clone, Default)]
pub struct ReturnSeries {
    pub points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    /// `r_t = close_t / close_{t-1} - 1`; the first record has no return
    ///
    /// Closes are assumed validated (finite and positive).
    pub fn from_series(series: &PriceSeries) -> Self {
        let points = series
            .data
            .windows(2)
            .map(|w| ReturnPoint {
                period_start: w[1].timestamp,
                ret: w[1].close / w[0].close - 1.0,
            })
            .collect();

        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
