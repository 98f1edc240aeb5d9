use super::{AnomalyConfig, AnomalyFlag, IsolationForest, MultivariateDetector};
use crate::data::PriceSeries;
use crate::error::{Error, Result};
use crate::features::{derive_features, FeatureMatrix};

/// Flag joint price/volume shocks in a raw series
///
/// Each record after the first becomes an (abs price delta, abs volume delta)
/// feature vector; the isolation forest labels roughly
/// `contamination_fraction` of them as anomalous. Flags come back in
/// chronological order.
pub fn detect_anomalies(series: &PriceSeries, config: &AnomalyConfig) -> Result<Vec<AnomalyFlag>> {
    config.validate()?;
    log::info!("Starting anomaly detection over {} records", series.len());

    series.ensure_not_empty()?;
    series.validate_ordering()?;
    series.validate_closes()?;
    series.validate_volumes()?;

    let records = derive_features(series);
    if records.len() < 2 {
        return Err(Error::InsufficientData(format!(
            "anomaly detection needs at least 2 feature records, got {} from {} raw records",
            records.len(),
            series.len()
        )));
    }

    let features = FeatureMatrix::from_records(&records);
    let mut forest = IsolationForest::from_config(config);
    let result = forest.fit_detect(&features.data)?;

    let flags: Vec<AnomalyFlag> = result
        .anomaly_indices()
        .into_iter()
        .map(|i| AnomalyFlag {
            timestamp: features.timestamps[i],
        })
        .collect();

    log::info!(
        "Anomaly detection complete. Found {} anomalies among {} feature records ({:.3}%)",
        flags.len(),
        features.len(),
        result.anomaly_rate() * 100.0
    );
    Ok(flags)
}
