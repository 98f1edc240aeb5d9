use super::ResultSink;
use crate::anomaly::AnomalyFlag;
use crate::error::Result;
use crate::volatility::VolatilityByWeekday;

/// Keeps the most recently written tables in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub volatility: Option<Vec<VolatilityByWeekday>>,
    pub anomalies: Option<Vec<AnomalyFlag>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultSink for MemorySink {
    fn write_volatility(&mut self, rows: &[VolatilityByWeekday]) -> Result<()> {
        self.volatility = Some(rows.to_vec());
        Ok(())
    }

    fn write_anomalies(&mut self, flags: &[AnomalyFlag]) -> Result<()> {
        self.anomalies = Some(flags.to_vec());
        Ok(())
    }
}
