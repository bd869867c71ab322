//! Export the comparison table to CSV.
//!
//! One row per selected date, one column per series. Absent values are empty
//! cells so spreadsheets read them as blanks rather than zeros.

use std::fs::File;
use std::path::Path;

use crate::domain::{ComparisonRow, SeriesId};
use crate::error::AppError;

/// Write comparison rows to a CSV file.
pub fn write_comparison_csv(path: &Path, series: &[SeriesId], rows: &[ComparisonRow]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_comparison(file, series, rows)
}

/// Write comparison rows as CSV to any writer.
pub fn write_comparison<W: std::io::Write>(
    out: W,
    series: &[SeriesId],
    rows: &[ComparisonRow],
) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["date".to_string()];
    header.extend(series.iter().map(|id| id.to_string()));
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV header: {e}")))?;

    for row in rows {
        let mut record = vec![row.date.to_string()];
        record.extend(
            series
                .iter()
                .map(|id| row.rate_for(id).map(|v| format!("{v:.4}")).unwrap_or_default()),
        );
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
