//! Clamp a requested list of highlight dates to the selection cap.

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::{MAX_SELECTED_DATES, SelectionOutcome};

/// Keep at most [`MAX_SELECTED_DATES`] dates, in the order supplied.
///
/// Timeline membership is not checked here; a date outside the timeline simply
/// resolves to absences downstream.
pub fn apply_selection(requested: &[NaiveDate]) -> SelectionOutcome {
    let truncated = requested.len() > MAX_SELECTED_DATES;
    if truncated {
        warn!(
            requested = requested.len(),
            kept = MAX_SELECTED_DATES,
            "selection exceeds the date limit; keeping the first dates"
        );
    }
    SelectionOutcome {
        accepted: requested.iter().take(MAX_SELECTED_DATES).copied().collect(),
        truncated,
    }
}
