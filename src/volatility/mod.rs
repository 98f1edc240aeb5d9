//! Volatility by day of week
//!
//! Close prices are turned into simple returns, returns are grouped into
//! UTC calendar days, each day with at least two returns gets a population
//! standard deviation, and the daily values are averaged per weekday.

mod aggregator;
mod weekday;

pub use aggregator::*;
pub use weekday::*;

use serde::{Deserialize, Serialize};

/// One output row of the `volatility_by_day` table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityByWeekday {
    pub day_of_week: DayOfWeek,
    pub avg_volatility: f64,
}
