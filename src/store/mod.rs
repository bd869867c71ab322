//! In-memory series store.
//!
//! The store owns one [`Series`] per institution label and answers exact-date
//! lookups against them. Series are held behind `Arc` so a reload swaps the
//! whole series in a single assignment: anyone still holding the previous
//! `Arc` keeps a complete old series, never a half-updated one.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{BuildStats, Series, SeriesId};

/// A series that cannot be used by the rest of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataIntegrityError {
    #[error("series {id} has no usable observations after normalization ({rows_in} row(s) in)")]
    EmptySeries { id: SeriesId, rows_in: usize },
}

#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    // Load order is display order, so this is a Vec rather than a map.
    slots: Vec<(SeriesId, Arc<Series>)>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from normalized rows and store it under `id`.
    ///
    /// Replaces any previous series with the same id, keeping its position.
    /// On error the previous series (if any) is left in place.
    pub fn load(
        &mut self,
        id: SeriesId,
        rows: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Arc<Series>, DataIntegrityError> {
        self.load_with_stats(id, rows).map(|(series, _)| series)
    }

    /// Same as [`SeriesStore::load`], also returning what normalization did.
    pub fn load_with_stats(
        &mut self,
        id: SeriesId,
        rows: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<(Arc<Series>, BuildStats), DataIntegrityError> {
        let (series, stats) = Series::from_rows(id.clone(), rows);
        if series.is_empty() {
            return Err(DataIntegrityError::EmptySeries {
                id,
                rows_in: stats.rows_in,
            });
        }
        if stats.duplicates > 0 {
            debug!(series = %id, duplicates = stats.duplicates, "collapsed duplicate dates (last row wins)");
        }

        let series = Arc::new(series);
        match self.slots.iter_mut().find(|(sid, _)| *sid == id) {
            Some(slot) => {
                slot.1 = Arc::clone(&series);
                info!(series = %id, points = series.len(), "replaced series");
            }
            None => {
                self.slots.push((id.clone(), Arc::clone(&series)));
                info!(series = %id, points = series.len(), "loaded series");
            }
        }
        Ok((series, stats))
    }

    /// Exact-match rate for `date`, or `None` when the series has no observation
    /// on that calendar date (or the series is unknown).
    pub fn lookup(&self, id: &SeriesId, date: NaiveDate) -> Option<f64> {
        self.get(id)?.rate_on(date)
    }

    /// Stored dates for `id`, ascending. Empty for an unknown id.
    pub fn all_dates(&self, id: &SeriesId) -> Vec<NaiveDate> {
        self.get(id)
            .map(|s| s.dates().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, id: &SeriesId) -> Option<&Arc<Series>> {
        self.slots.iter().find(|(sid, _)| sid == id).map(|(_, s)| s)
    }

    /// Series in load order.
    pub fn series(&self) -> impl Iterator<Item = &Arc<Series>> + '_ {
        self.slots.iter().map(|(_, s)| s)
    }

    pub fn ids(&self) -> impl Iterator<Item = &SeriesId> + '_ {
        self.slots.iter().map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
