//! Shared session logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load sources -> series store -> timeline, then per interaction:
//! selection -> resolution -> markers
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::data::fred::{FetchedSeries, FredClient};
use crate::domain::{
    BuildStats, ComparisonRow, DashboardConfig, MarkerPoint, SelectionOutcome, Series, SeriesId,
    SourceKind, SourceSpec,
};
use crate::error::AppError;
use crate::io::ingest::{LoadedRows, load_rate_rows};
use crate::store::SeriesStore;
use crate::timeline::Timeline;

/// Months of history produced by `--demo`.
const DEMO_MONTHS: u32 = 60;

/// How one series was loaded, for the summary report.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub id: SeriesId,
    pub source: String,
    pub rows_read: usize,
    /// Rows rejected by the loader (unparseable date/rate).
    pub rows_dropped: usize,
    pub build: BuildStats,
    pub points: usize,
    pub first: Option<NaiveDate>,
    pub last: Option<NaiveDate>,
}

/// Everything one interaction pass produces.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub selection: SelectionOutcome,
    pub rows: Vec<ComparisonRow>,
    pub markers: Vec<MarkerPoint>,
}

/// A loaded store plus the timeline derived from it.
#[derive(Debug, Clone)]
pub struct Session {
    store: SeriesStore,
    timeline: Timeline,
    reports: Vec<LoadReport>,
}

impl Session {
    /// Load every configured source. Any series that ends up empty stops the
    /// pipeline here, before a timeline is built or anything is resolved.
    pub fn load(config: &DashboardConfig) -> Result<Self, AppError> {
        if config.sources.is_empty() {
            return Err(AppError::new(2, "No series configured."));
        }

        let mut store = SeriesStore::new();
        let mut reports = Vec::with_capacity(config.sources.len());
        let mut demo: Option<Vec<Vec<(NaiveDate, f64)>>> = None;
        let mut fred: Option<FredClient> = None;

        for (slot, spec) in config.sources.iter().enumerate() {
            let (rows, source, rows_read, rows_dropped) = match &spec.kind {
                SourceKind::Csv { path, column } => {
                    let LoadedRows {
                        rows,
                        row_errors,
                        rows_read,
                        ..
                    } = load_rate_rows(path, column.as_deref())?;
                    (rows, path.display().to_string(), rows_read, row_errors.len())
                }
                SourceKind::Fred { series_id } => {
                    let client = match fred.take() {
                        Some(c) => c,
                        None => FredClient::from_env()?,
                    };
                    let fetched = client.fetch_series(series_id, config.observation_end)?;
                    fred = Some(client);
                    fred_parts(series_id, fetched)
                }
                SourceKind::Demo => {
                    if demo.is_none() {
                        demo = Some(demo_paths(config.seed)?);
                    }
                    // Demo slots alternate between the two generated paths.
                    let rows = demo
                        .as_ref()
                        .and_then(|paths| paths.get(slot % 2))
                        .cloned()
                        .unwrap_or_default();
                    let n = rows.len();
                    (rows, format!("demo (seed {})", config.seed), n, 0)
                }
            };

            let (series, build) = store.load_with_stats(spec.id.clone(), rows)?;
            reports.push(report_for(spec, &series, source, rows_read, rows_dropped, build));
        }

        let timeline = Timeline::from_store(&store);
        info!(series = store.len(), dates = timeline.len(), "session ready");
        Ok(Self {
            store,
            timeline,
            reports,
        })
    }

    /// Wrap an already-built store.
    pub fn from_store(store: SeriesStore) -> Self {
        let timeline = Timeline::from_store(&store);
        Self {
            store,
            timeline,
            reports: Vec::new(),
        }
    }

    /// Replace (or add) one series and rebuild the timeline.
    pub fn reload(
        &mut self,
        id: SeriesId,
        rows: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Arc<Series>, AppError> {
        let series = self.store.load(id, rows)?;
        self.timeline = Timeline::from_store(&self.store);
        Ok(series)
    }

    /// One recomputation pass for a user interaction.
    pub fn interact(&self, requested: &[NaiveDate]) -> View {
        let selection = crate::selection::apply_selection(requested);
        let rows = crate::resolve::resolve(&selection.accepted, &self.store);
        let markers = crate::resolve::markers(&rows);
        View {
            selection,
            rows,
            markers,
        }
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn reports(&self) -> &[LoadReport] {
        &self.reports
    }
}

fn demo_paths(seed: u64) -> Result<Vec<Vec<(NaiveDate, f64)>>, AppError> {
    let start = NaiveDate::from_ymd_opt(2019, 1, 1)
        .ok_or_else(|| AppError::new(4, "Invalid demo start date."))?;
    let data = crate::data::demo::generate(seed, start, DEMO_MONTHS)?;
    Ok(vec![data.a, data.b])
}

/// Rows, source label, rows read and rows dropped for a FRED download.
fn fred_parts(series_id: &str, fetched: FetchedSeries) -> (Vec<(NaiveDate, f64)>, String, usize, usize) {
    let FetchedSeries {
        rows,
        observations,
        skipped,
    } = fetched;
    (rows, format!("FRED {series_id}"), observations, skipped)
}

fn report_for(
    spec: &SourceSpec,
    series: &Series,
    source: String,
    rows_read: usize,
    rows_dropped: usize,
    build: BuildStats,
) -> LoadReport {
    LoadReport {
        id: spec.id.clone(),
        source,
        rows_read,
        rows_dropped,
        build,
        points: series.len(),
        first: series.first_date(),
        last: series.last_date(),
    }
}

/// Parse user-supplied highlight dates (CLI `--date` values).
pub fn parse_requested_dates(raw: &[String]) -> Result<Vec<NaiveDate>, AppError> {
    raw.iter()
        .map(|s| {
            crate::io::ingest::parse_date(s.trim())
                .map_err(|e| AppError::new(2, format!("Invalid --date value: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn csv_source(id: &str, file: &tempfile::NamedTempFile) -> SourceSpec {
        SourceSpec {
            id: SeriesId::new(id),
            kind: SourceKind::Csv {
                path: file.path().to_path_buf(),
                column: None,
            },
        }
    }

    #[test]
    fn loads_two_csvs_and_resolves() {
        let fed = csv_file("DATE,FEDFUNDS\n2024-01-01,5.33\n2024-02-01,5.33\n2024-03-01,5.50\n");
        let ecb = csv_file("TIME_PERIOD,OBS_VALUE\n2024-01-01,4.50\n2024-03-01,4.75\nbad,1\n");
        let config = DashboardConfig {
            sources: vec![csv_source("FED", &fed), csv_source("ECB", &ecb)],
            ..DashboardConfig::default()
        };

        let session = Session::load(&config).unwrap();
        assert_eq!(
            session.timeline().dates(),
            &[d(2024, 1, 1), d(2024, 2, 1), d(2024, 3, 1)]
        );
        assert_eq!(session.reports()[1].rows_read, 3);
        assert_eq!(session.reports()[1].rows_dropped, 1);

        let view = session.interact(&[d(2024, 3, 1)]);
        assert_eq!(view.rows[0].rate_for(&SeriesId::new("ECB")), Some(4.75));
        assert_eq!(view.markers.len(), 2);
    }

    #[test]
    fn empty_series_stops_the_pipeline() {
        let fed = csv_file("DATE,FEDFUNDS\n2024-01-01,5.33\n");
        let ecb = csv_file("DATE,RATE\n2024-01-01,.\n");
        let config = DashboardConfig {
            sources: vec![csv_source("FED", &fed), csv_source("ECB", &ecb)],
            ..DashboardConfig::default()
        };

        let err = Session::load(&config).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("ECB"));
    }

    #[test]
    fn demo_sources_load_both_series() {
        let config = DashboardConfig {
            sources: vec![
                SourceSpec {
                    id: SeriesId::new("FED"),
                    kind: SourceKind::Demo,
                },
                SourceSpec {
                    id: SeriesId::new("ECB"),
                    kind: SourceKind::Demo,
                },
            ],
            ..DashboardConfig::default()
        };

        let session = Session::load(&config).unwrap();
        assert_eq!(session.store().len(), 2);
        assert_eq!(session.reports()[0].points, DEMO_MONTHS as usize);
        assert!(session.timeline().len() > DEMO_MONTHS as usize);
    }

    #[test]
    fn fred_skips_count_as_dropped_rows() {
        let fetched = FetchedSeries {
            rows: vec![(d(2024, 1, 1), 5.33), (d(2024, 3, 1), 5.50)],
            observations: 4,
            skipped: 2,
        };
        let (rows, source, rows_read, rows_dropped) = fred_parts("FEDFUNDS", fetched);
        assert_eq!(source, "FRED FEDFUNDS");
        assert_eq!((rows_read, rows_dropped), (4, 2));

        let spec = SourceSpec {
            id: SeriesId::new("FED"),
            kind: SourceKind::Fred {
                series_id: "FEDFUNDS".to_string(),
            },
        };
        let mut store = SeriesStore::new();
        let (series, build) = store.load_with_stats(spec.id.clone(), rows).unwrap();
        let report = report_for(&spec, &series, source, rows_read, rows_dropped, build);
        assert_eq!(report.rows_read, 4);
        assert_eq!(report.rows_dropped, 2);
        assert_eq!(report.points, 2);
    }

    #[test]
    fn reload_rebuilds_timeline() {
        let mut store = SeriesStore::new();
        store.load(SeriesId::new("FED"), vec![(d(2024, 1, 1), 5.33)]).unwrap();
        let mut session = Session::from_store(store);

        session
            .reload(SeriesId::new("FED"), vec![(d(2024, 2, 1), 5.50)])
            .unwrap();
        assert_eq!(session.timeline().dates(), &[d(2024, 2, 1)]);
        assert!(session.interact(&[d(2024, 1, 1)]).markers.is_empty());
    }

    #[test]
    fn parse_requested_dates_rejects_garbage() {
        let ok = parse_requested_dates(&["2024-01-01".to_string(), " 2024-03 ".to_string()]).unwrap();
        assert_eq!(ok, vec![d(2024, 1, 1), d(2024, 3, 1)]);
        assert_eq!(
            parse_requested_dates(&["yesterday".to_string()]).unwrap_err().exit_code(),
            2
        );
    }
}
