//! OHLC price/volume records
//!
//! Only the close price and the traded volume feed the analytics, so a
//! record keeps just those two values next to its timestamp.

use crate::error::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Single raw market observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Observation instant, integer seconds since epoch on the wire
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub volume: f64,
}

/// One row of an ingested CSV table
///
/// Volume may arrive as `volume` or `volume_btc`; a row without either keeps
/// a NaN volume and is rejected by [`PriceSeries::validate_volumes`].
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(with = "chrono::serde::ts_seconds")]
    timestamp: DateTime<Utc>,
    close: f64,
    volume: Option<f64>,
    volume_btc: Option<f64>,
}

impl From<CsvRow> for RawRecord {
    fn from(row: CsvRow) -> Self {
        let volume = row.volume.or(row.volume_btc).unwrap_or(f64::NAN);
        Self::new(row.timestamp, row.close, volume)
    }
}

impl RawRecord {
    /// Create a new record
    pub fn new(timestamp: DateTime<Utc>, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            close,
            volume,
        }
    }

    /// Create a record from integer seconds since epoch
    pub fn from_epoch_seconds(secs: i64, close: f64, volume: f64) -> Result<Self> {
        let timestamp = Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| Error::InvalidInput(format!("timestamp {} is out of range", secs)))?;
        Ok(Self::new(timestamp, close, volume))
    }
}

/// Time-ordered series of raw records, read-only to the analysis stages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    pub data: Vec<RawRecord>,
}

impl PriceSeries {
    /// Create an empty series
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Create a series with data
    pub fn with_data(data: Vec<RawRecord>) -> Self {
        Self { data }
    }

    /// Check if series is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Fail with `InsufficientData` on an empty series
    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.data.is_empty() {
            return Err(Error::InsufficientData(
                "input series contains no records".to_string(),
            ));
        }
        Ok(())
    }

    /// Check that timestamps are strictly increasing
    pub fn validate_ordering(&self) -> Result<()> {
        for (i, w) in self.data.windows(2).enumerate() {
            if w[1].timestamp <= w[0].timestamp {
                let kind = if w[1].timestamp == w[0].timestamp {
                    "duplicate"
                } else {
                    "out-of-order"
                };
                return Err(Error::InvalidInput(format!(
                    "{} timestamp {} at row {} (previous {})",
                    kind,
                    w[1].timestamp.timestamp(),
                    i + 1,
                    w[0].timestamp.timestamp()
                )));
            }
        }
        Ok(())
    }

    /// Check that every close is a finite number
    pub fn validate_closes(&self) -> Result<()> {
        for (i, record) in self.data.iter().enumerate() {
            if !record.close.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "non-numeric close {} at row {}",
                    record.close, i
                )));
            }
        }
        Ok(())
    }

    /// Check that every close is strictly positive
    ///
    /// A zero close would make the following return undefined.
    pub fn validate_positive_closes(&self) -> Result<()> {
        self.validate_closes()?;
        match self.data.iter().position(|r| r.close <= 0.0) {
            Some(i) => Err(Error::InvalidInput(format!(
                "non-positive close {} at row {}",
                self.data[i].close, i
            ))),
            None => Ok(()),
        }
    }

    /// Check that every volume is finite and non-negative
    pub fn validate_volumes(&self) -> Result<()> {
        for (i, record) in self.data.iter().enumerate() {
            if record.volume.is_nan() {
                return Err(Error::InvalidInput(format!(
                    "missing or non-numeric volume at row {}",
                    i
                )));
            }
            if record.volume.is_infinite() || record.volume < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "invalid volume {} at row {}",
                    record.volume, i
                )));
            }
        }
        Ok(())
    }

    /// Load from a CSV file with `timestamp`, `close` and `volume` (or
    /// `volume_btc`) columns
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let series = Self::from_reader(file)?;
        log::info!(
            "Loaded {} records from {}",
            series.len(),
            path.as_ref().display()
        );
        Ok(series)
    }

    /// Load from any CSV source
    ///
    /// Extra columns such as `open`, `high` and `low` are ignored. Rows are
    /// kept in file order. When both `volume` and `volume_btc` are present,
    /// `volume` wins.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut data = Vec::new();

        for result in reader.deserialize::<CsvRow>() {
            let row = result.map_err(|e| match e.kind() {
                csv::ErrorKind::Deserialize { .. } => Error::InvalidInput(e.to_string()),
                _ => Error::Csv(e),
            })?;
            data.push(RawRecord::from(row));
        }

        Ok(Self::with_data(data))
    }
}
