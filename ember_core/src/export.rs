//! CSV export of the day history.
//!
//! One row per stored day, labels joined with `;`. The file is synced to
//! disk before returning.

use crate::{DayCounters, Result};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: String,
    morning: u32,
    afternoon: u32,
    evening: u32,
    total: u32,
    tags: String,
    strategies: String,
}

impl From<&DayCounters> for CsvRow {
    fn from(day: &DayCounters) -> Self {
        CsvRow {
            date: day.date.format("%Y-%m-%d").to_string(),
            morning: day.morning,
            afternoon: day.afternoon,
            evening: day.evening,
            total: day.total(),
            tags: day.tags.join(";"),
            strategies: day.strategies.join(";"),
        }
    }
}

/// Write `history` to `path`, replacing any existing file
///
/// Returns the number of rows written.
pub fn export_history_csv(history: &[DayCounters], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    for day in history {
        writer.serialize(CsvRow::from(day))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} days to {:?}", history.len(), path);
    Ok(history.len())
}
