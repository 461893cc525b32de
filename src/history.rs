use crate::error::Result;
use crate::schema::FinancialSummary;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::PathBuf;

/// One saved month in the historical-tracking file.
///
/// The period label is opaque text ("October/2024", "2024-Q3", ...); this
/// store never parses or orders it chronologically. Sorting is the
/// caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub period_label: String,
    pub gross_revenue_real: f64,
    pub net_profit: f64,
    pub net_margin_percent: f64,
    pub fixed_cost_total: f64,
    pub average_ticket_real: f64,
}

impl HistoryRecord {
    pub fn from_summary(summary: &FinancialSummary) -> Self {
        Self {
            period_label: summary.period_label.clone(),
            gross_revenue_real: summary.gross_revenue_real,
            net_profit: summary.net_profit,
            net_margin_percent: summary.net_margin_percent,
            fixed_cost_total: summary.fixed_cost_total,
            average_ticket_real: summary.average_ticket_real,
        }
    }
}

/// Delimited-text history keyed by period label, last write wins.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Returns every saved record in file order. A store that does not
    /// exist yet is simply empty.
    pub fn load(&self) -> Result<Vec<HistoryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(File::open(&self.path)?);

        let mut records = Vec::new();
        for result in reader.deserialize() {
            let record: HistoryRecord = result?;
            records.push(record);
        }
        Ok(records)
    }

    /// Inserts a record, replacing any existing record with the same
    /// period label.
    pub fn upsert(&self, record: HistoryRecord) -> Result<()> {
        let mut records = self.load()?;
        records.retain(|r| r.period_label != record.period_label);
        records.push(record);
        self.write_all(&records)
    }

    /// Removes the record for a period. Returns whether one existed.
    pub fn remove(&self, period_label: &str) -> Result<bool> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.period_label != period_label);
        let removed = records.len() != before;
        if removed {
            self.write_all(&records)?;
        }
        Ok(removed)
    }

    /// Deletes the whole history file.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn write_all(&self, records: &[HistoryRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(File::create(&self.path)?);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
