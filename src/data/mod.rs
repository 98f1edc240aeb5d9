//! Raw market data: records, series validation and CSV ingestion

mod ohlcv;

pub use ohlcv::*;
