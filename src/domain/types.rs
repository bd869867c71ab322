//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - held in memory by the series store for the lifetime of a session
//! - exported to JSON/CSV
//! - handed to the chart and table renderers without conversion

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Hard cap on the number of highlighted dates.
pub const MAX_SELECTED_DATES: usize = 4;

/// Institution label identifying a series (e.g. `FED`, `ECB`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesId(String);

impl SeriesId {
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(label.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SeriesId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A single observation: the rate (in percent) a series held on a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub date: NaiveDate,
    pub rate: f64,
}

impl RatePoint {
    pub fn new(date: NaiveDate, rate: f64) -> Self {
        Self { date, rate }
    }
}

/// One institution's sorted, deduplicated `(date, rate)` history.
///
/// Construction goes through [`Series::from_rows`], which is the only place the
/// ordering/uniqueness invariants are established. There is no mutable access
/// afterwards; replacing data means building a new `Series`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    id: SeriesId,
    points: Vec<RatePoint>,
}

/// What happened while building a [`Series`] from raw rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub rows_in: usize,
    /// Rows dropped because the rate was not finite.
    pub non_finite: usize,
    /// Earlier rows overwritten by a later row with the same date.
    pub duplicates: usize,
}

impl Series {
    /// Build a series from rows in load order.
    ///
    /// Rows are stably sorted by date, so for duplicate dates the last-loaded
    /// row is the one that survives.
    pub fn from_rows(id: SeriesId, rows: impl IntoIterator<Item = (NaiveDate, f64)>) -> (Self, BuildStats) {
        let mut stats = BuildStats::default();
        let mut sorted: Vec<RatePoint> = Vec::new();
        for (date, rate) in rows {
            stats.rows_in += 1;
            if !rate.is_finite() {
                stats.non_finite += 1;
                continue;
            }
            sorted.push(RatePoint::new(date, rate));
        }
        sorted.sort_by_key(|p| p.date);

        let mut points: Vec<RatePoint> = Vec::with_capacity(sorted.len());
        for p in sorted {
            match points.last_mut() {
                Some(last) if last.date == p.date => {
                    stats.duplicates += 1;
                    *last = p;
                }
                _ => points.push(p),
            }
        }

        (Self { id, points }, stats)
    }

    pub fn id(&self) -> &SeriesId {
        &self.id
    }

    pub fn points(&self) -> &[RatePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Exact calendar-date lookup. No interpolation, no nearest neighbour.
    pub fn rate_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].rate)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Min/max rate across the series.
    pub fn rate_range(&self) -> Option<(f64, f64)> {
        let mut it = self.points.iter().map(|p| p.rate);
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), r| (lo.min(r), hi.max(r))))
    }
}

/// Result of clamping a requested date list to [`MAX_SELECTED_DATES`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SelectionOutcome {
    pub accepted: Vec<NaiveDate>,
    /// `true` when the request held more dates than the cap allows.
    pub truncated: bool,
}

/// For one selected date: each loaded series' rate on that exact date, or absence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub date: NaiveDate,
    /// One entry per loaded series, in load order.
    pub rates: Vec<(SeriesId, Option<f64>)>,
}

impl ComparisonRow {
    pub fn rate_for(&self, id: &SeriesId) -> Option<f64> {
        self.rates
            .iter()
            .find(|(sid, _)| sid == id)
            .and_then(|(_, rate)| *rate)
    }
}

/// A chart annotation: only emitted when the series has a value on the date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPoint {
    pub series: SeriesId,
    pub date: NaiveDate,
    pub rate: f64,
}

/// Where a series' rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// A CSV export on disk. `column` overrides rate column detection.
    Csv { path: PathBuf, column: Option<String> },
    /// A FRED series fetched over HTTP (e.g. `FEDFUNDS`).
    Fred { series_id: String },
    /// Deterministic synthetic data from [`crate::data::demo`].
    Demo,
}

/// One configured series: its label plus where to load it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub id: SeriesId,
    pub kind: SourceKind,
}

/// Run configuration assembled from CLI flags and the environment.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Series in display order: A first, then B.
    pub sources: Vec<SourceSpec>,
    /// Requested highlight dates, in the order the user supplied them.
    pub requested_dates: Vec<NaiveDate>,
    /// Seed for the demo generator.
    pub seed: u64,
    /// Latest observation date when fetching from FRED.
    pub observation_end: Option<NaiveDate>,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            requested_dates: Vec::new(),
            seed: 42,
            observation_end: None,
            plot: true,
            plot_width: 100,
            plot_height: 25,
        }
    }
}

/// A saved comparison (JSON).
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonFile<'a> {
    pub tool: &'static str,
    pub series: Vec<&'a Series>,
    pub selection: &'a SelectionOutcome,
    pub rows: &'a [ComparisonRow],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn from_rows_sorts_and_keeps_last_duplicate() {
        let rows = vec![
            (d(2024, 3, 1), 5.50),
            (d(2024, 1, 1), 5.33),
            (d(2024, 3, 1), 5.25),
            (d(2024, 2, 1), f64::NAN),
        ];
        let (series, stats) = Series::from_rows(SeriesId::new("FED"), rows);

        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0], RatePoint::new(d(2024, 1, 1), 5.33));
        assert_eq!(series.points()[1], RatePoint::new(d(2024, 3, 1), 5.25));
        assert_eq!(stats.rows_in, 4);
        assert_eq!(stats.non_finite, 1);
        assert_eq!(stats.duplicates, 1);
    }

    #[test]
    fn rate_on_requires_exact_date() {
        let (series, _) = Series::from_rows(
            SeriesId::new("ECB"),
            vec![(d(2024, 1, 1), 4.50), (d(2024, 3, 1), 4.75)],
        );
        assert_eq!(series.rate_on(d(2024, 1, 1)), Some(4.50));
        assert_eq!(series.rate_on(d(2024, 2, 1)), None);
        assert_eq!(series.rate_on(d(2024, 3, 2)), None);
    }

    #[test]
    fn series_id_trims_label() {
        assert_eq!(SeriesId::new("  FED "), SeriesId::new("FED"));
        assert_eq!(SeriesId::new("FED").to_string(), "FED");
    }

    #[test]
    fn rate_range_spans_all_points() {
        let (series, _) = Series::from_rows(
            SeriesId::new("FED"),
            vec![(d(2024, 1, 1), 5.33), (d(2024, 2, 1), 0.25), (d(2024, 3, 1), 5.50)],
        );
        assert_eq!(series.rate_range(), Some((0.25, 5.50)));
    }
}
