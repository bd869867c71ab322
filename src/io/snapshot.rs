//! Write the full comparison (series, selection, resolved rows) as JSON.
//!
//! The schema is defined by `domain::ComparisonFile`.

use std::fs::File;
use std::path::Path;

use crate::app::pipeline::{Session, View};
use crate::domain::ComparisonFile;
use crate::error::AppError;

/// Write a comparison JSON file.
pub fn write_comparison_json(path: &Path, session: &Session, view: &View) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &comparison_file(session, view))
        .map_err(|e| AppError::new(4, format!("Failed to write comparison JSON: {e}")))?;

    Ok(())
}

fn comparison_file<'a>(session: &'a Session, view: &'a View) -> ComparisonFile<'a> {
    ComparisonFile {
        tool: "rates",
        series: session.store().series().map(|s| &**s).collect(),
        selection: &view.selection,
        rows: &view.rows,
    }
}
