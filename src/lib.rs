//! Market pulse analytics for Bitcoin OHLC data
//!
//! Turns a time-ordered close/volume series into two tables:
//! average return volatility per weekday, and the timestamps of joint
//! price/volume shocks found by an isolation forest.
//!
//! # Modules
//!
//! - `data`: raw records, series validation, CSV ingestion
//! - `features`: returns and absolute price/volume deltas
//! - `volatility`: volatility aggregated by day of week
//! - `anomaly`: isolation-forest anomaly detection
//! - `sink`: output tables with replace-on-write semantics
//! - `pipeline`: both stages over one series, independently
//!
//! # Example
//!
//! ```no_run
//! use market_pulse::{detect_anomalies, volatility_by_weekday, AnomalyConfig, PriceSeries};
//!
//! let series = PriceSeries::from_csv("btc_ohlc_raw.csv").unwrap();
//!
//! let by_day = volatility_by_weekday(&series).unwrap();
//! let flags = detect_anomalies(&series, &AnomalyConfig::default().with_seed(42)).unwrap();
//! ```

pub mod anomaly;
pub mod data;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod sink;
pub mod volatility;

pub use anomaly::*;
pub use data::*;
pub use error::{Error, Result};
pub use features::*;
pub use pipeline::*;
pub use sink::*;
pub use volatility::*;
