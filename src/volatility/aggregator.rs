use super::{DayOfWeek, VolatilityByWeekday};
use crate::data::PriceSeries;
use crate::error::Result;
use crate::features::ReturnSeries;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Population standard deviation; `None` below two observations
pub fn population_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}

/// Group returns into UTC calendar days
pub fn bucket_by_day(returns: &ReturnSeries) -> BTreeMap<NaiveDate, Vec<f64>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for point in &returns.points {
        buckets
            .entry(point.period_start.date_naive())
            .or_default()
            .push(point.ret);
    }
    buckets
}

/// Per-day volatility of close-to-close returns
///
/// Days with fewer than two returns are left out rather than reported as zero.
pub fn daily_volatility(series: &PriceSeries) -> Result<BTreeMap<NaiveDate, f64>> {
    series.ensure_not_empty()?;
    series.validate_ordering()?;
    series.validate_positive_closes()?;

    let returns = ReturnSeries::from_series(series);
    let buckets = bucket_by_day(&returns);
    let total_buckets = buckets.len();

    let daily: BTreeMap<NaiveDate, f64> = buckets
        .into_iter()
        .filter_map(|(day, values)| population_std(&values).map(|std| (day, std)))
        .collect();

    log::debug!(
        "{} returns across {} calendar days, {} with a defined volatility",
        returns.len(),
        total_buckets,
        daily.len()
    );

    Ok(daily)
}

/// Average daily volatility per weekday, Monday first
///
/// Weekdays without any contributing day are omitted. A series too short to
/// produce a single daily value yields an empty result, not an error; an
/// empty series is `InsufficientData`.
pub fn volatility_by_weekday(series: &PriceSeries) -> Result<Vec<VolatilityByWeekday>> {
    log::info!("Starting volatility analysis over {} records", series.len());
    let daily = daily_volatility(series)?;

    // weekday -> (sum, count)
    let mut by_weekday: BTreeMap<DayOfWeek, (f64, usize)> = BTreeMap::new();
    for (day, vol) in daily {
        let entry = by_weekday.entry(DayOfWeek::of(day)).or_insert((0.0, 0));
        entry.0 += vol;
        entry.1 += 1;
    }

    let rows: Vec<VolatilityByWeekday> = by_weekday
        .into_iter()
        .map(|(day_of_week, (sum, count))| VolatilityByWeekday {
            day_of_week,
            avg_volatility: sum / count as f64,
        })
        .collect();

    if rows.is_empty() {
        log::warn!("No calendar day has enough returns; volatility table is empty");
    }
    log::info!("Volatility analysis complete: {} weekday rows", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawRecord;
    use crate::error::Error;

    const HOUR: i64 = 3600;
    // 2024-01-01 00:00:00 UTC, a Monday
    const MONDAY: i64 = 1_704_067_200;

    fn hourly(start: i64, closes: &[f64]) -> PriceSeries {
        PriceSeries::with_data(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| RawRecord::from_epoch_seconds(start + i as i64 * HOUR, c, 1.0).unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_population_std() {
        assert_eq!(population_std(&[1.0]), None);
        assert_eq!(population_std(&[]), None);
        let std = population_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_price_has_zero_volatility() {
        // three full days
        let series = hourly(MONDAY, &vec![42_000.0; 72]);
        let rows = volatility_by_weekday(&series).unwrap();

        assert_eq!(rows.len(), 3);
        for row in rows {
            assert_eq!(row.avg_volatility, 0.0);
        }
    }

    #[test]
    fn test_sparse_buckets_yield_empty_result() {
        // one record per day: every day holds at most one return
        let data = (0..5)
            .map(|i| RawRecord::from_epoch_seconds(MONDAY + i * 24 * HOUR, 100.0 + i as f64, 1.0).unwrap())
            .collect();
        let rows = volatility_by_weekday(&PriceSeries::with_data(data)).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_single_record_is_empty_not_error() {
        let rows = volatility_by_weekday(&hourly(MONDAY, &[100.0])).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_empty_series_is_insufficient() {
        assert!(matches!(
            volatility_by_weekday(&PriceSeries::new()),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn test_rejects_bad_input() {
        let nan = hourly(MONDAY, &[100.0, f64::NAN, 101.0]);
        assert!(matches!(volatility_by_weekday(&nan), Err(Error::InvalidInput(_))));

        let mut unordered = hourly(MONDAY, &[100.0, 101.0, 102.0]);
        unordered.data.swap(1, 2);
        assert!(matches!(volatility_by_weekday(&unordered), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_weekday_mean_is_unweighted() {
        // Two Mondays: the first with returns +1%,-1%; the second with +2%,-2%,+2%,-2%
        let mut data = Vec::new();
        let week = 7 * 24 * HOUR;
        for (i, c) in [100.0, 101.0, 99.99].iter().enumerate() {
            data.push(RawRecord::from_epoch_seconds(MONDAY + i as i64 * HOUR, *c, 1.0).unwrap());
        }
        let mut price = 100.0;
        data.push(RawRecord::from_epoch_seconds(MONDAY + week, price, 1.0).unwrap());
        for i in 1..=4 {
            price *= if i % 2 == 1 { 1.02 } else { 0.98 };
            data.push(RawRecord::from_epoch_seconds(MONDAY + week + i * HOUR, price, 1.0).unwrap());
        }
        let series = PriceSeries::with_data(data);

        let daily = daily_volatility(&series).unwrap();
        assert_eq!(daily.len(), 2);
        let expected = daily.values().sum::<f64>() / 2.0;

        let rows = volatility_by_weekday(&series).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].day_of_week, DayOfWeek::Monday);
        assert!((rows[0].avg_volatility - expected).abs() < 1e-12);
        assert!((daily.values().next().unwrap() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_idempotent() {
        let closes: Vec<f64> = (0..100).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let series = hourly(MONDAY, &closes);
        assert_eq!(
            volatility_by_weekday(&series).unwrap(),
            volatility_by_weekday(&series).unwrap()
        );
    }
}
