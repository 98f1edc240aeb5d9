use super::{ResultSink, ANOMALY_TABLE, VOLATILITY_TABLE};
use crate::anomaly::AnomalyFlag;
use crate::error::Result;
use crate::volatility::VolatilityByWeekday;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes each table as `<dir>/<table>.csv`
///
/// Rows go to a temporary file in the same directory which is then renamed
/// over the target, so readers never see a half-written table.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    /// Create the sink, creating `dir` if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Path of a table file
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", table))
    }

    fn replace_table<T: Serialize>(&self, table: &str, header: &[&str], rows: &[T]) -> Result<()> {
        let target = self.table_path(table);
        let tmp = self.dir.join(format!(".{}.csv.tmp", table));

        if let Err(e) = write_and_rename(&tmp, &target, header, rows) {
            // the previous table, if any, is left untouched
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        log::info!("Wrote {} rows to {}", rows.len(), target.display());
        Ok(())
    }
}

fn write_and_rename<T: Serialize>(tmp: &Path, target: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(tmp)?;
        // explicit header so an empty table still has its columns
        writer.write_record(header)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    fs::rename(tmp, target)?;
    Ok(())
}

impl ResultSink for CsvSink {
    fn write_volatility(&mut self, rows: &[VolatilityByWeekday]) -> Result<()> {
        self.replace_table(VOLATILITY_TABLE, &["day_of_week", "avg_volatility"], rows)
    }

    fn write_anomalies(&mut self, flags: &[AnomalyFlag]) -> Result<()> {
        self.replace_table(ANOMALY_TABLE, &["timestamp"], flags)
    }
}
