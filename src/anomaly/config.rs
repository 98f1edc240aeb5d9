use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of the anomaly stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Number of isolation trees
    pub ensemble_size: usize,
    /// Expected share of anomalous records, in (0, 0.5)
    pub contamination_fraction: f64,
    /// Seed for reproducible runs; fresh entropy when absent
    pub random_seed: Option<u64>,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            ensemble_size: 100,
            contamination_fraction: 0.001,
            random_seed: None,
        }
    }
}

impl AnomalyConfig {
    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Set number of trees
    pub fn with_ensemble_size(mut self, ensemble_size: usize) -> Self {
        self.ensemble_size = ensemble_size;
        self
    }

    /// Set contamination fraction
    pub fn with_contamination(mut self, contamination_fraction: f64) -> Self {
        self.contamination_fraction = contamination_fraction;
        self
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.ensemble_size == 0 {
            return Err(Error::ConfigurationError(
                "ensemble_size must be at least 1".to_string(),
            ));
        }
        // also rejects NaN
        if !(self.contamination_fraction > 0.0 && self.contamination_fraction < 0.5) {
            return Err(Error::ConfigurationError(format!(
                "contamination_fraction must be in (0, 0.5), got {}",
                self.contamination_fraction
            )));
        }
        Ok(())
    }

    /// Load and validate a JSON config; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}
