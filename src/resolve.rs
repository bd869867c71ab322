//! Point resolution: the rate each series held on each selected date.
//!
//! Both the comparison table and the chart markers are derived from the rows
//! produced here, so the two views can never disagree.

use chrono::NaiveDate;

use crate::domain::{ComparisonRow, MarkerPoint};
use crate::store::SeriesStore;

/// One row per accepted date, same order, one entry per loaded series.
///
/// Never fails: a series without an observation on the date yields `None`.
pub fn resolve(accepted: &[NaiveDate], store: &SeriesStore) -> Vec<ComparisonRow> {
    accepted
        .iter()
        .map(|&date| ComparisonRow {
            date,
            rates: store
                .ids()
                .map(|id| (id.clone(), store.lookup(id, date)))
                .collect(),
        })
        .collect()
}

/// Chart annotations for the present values in `rows`.
pub fn markers(rows: &[ComparisonRow]) -> Vec<MarkerPoint> {
    rows.iter()
        .flat_map(|row| {
            row.rates.iter().filter_map(move |(id, rate)| {
                rate.map(|rate| MarkerPoint {
                    series: id.clone(),
                    date: row.date,
                    rate,
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesId;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn store() -> SeriesStore {
        let mut store = SeriesStore::new();
        store
            .load(
                SeriesId::new("FED"),
                vec![(d(2024, 1, 1), 5.33), (d(2024, 2, 1), 5.33), (d(2024, 3, 1), 5.50)],
            )
            .unwrap();
        store
            .load(
                SeriesId::new("ECB"),
                vec![(d(2024, 1, 1), 4.50), (d(2024, 3, 1), 4.75)],
            )
            .unwrap();
        store
    }

    #[test]
    fn resolves_present_and_absent_values() {
        let store = store();
        let fed = SeriesId::new("FED");
        let ecb = SeriesId::new("ECB");
        let rows = resolve(&[d(2024, 2, 1), d(2024, 5, 1)], &store);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d(2024, 2, 1));
        assert_eq!(rows[0].rate_for(&fed), Some(5.33));
        assert_eq!(rows[0].rate_for(&ecb), None);
        assert_eq!(rows[1].rates, vec![(fed, None), (ecb, None)]);
    }

    #[test]
    fn markers_skip_absences() {
        let store = store();
        let rows = resolve(&[d(2024, 2, 1), d(2024, 3, 1)], &store);
        let marks = markers(&rows);

        assert_eq!(marks.len(), 3);
        assert_eq!(marks[0].series, SeriesId::new("FED"));
        assert_eq!(marks[0].date, d(2024, 2, 1));
        assert_eq!(marks[2].series, SeriesId::new("ECB"));
        assert_eq!(marks[2].rate, 4.75);
    }

    #[test]
    fn empty_selection_resolves_to_nothing() {
        assert!(resolve(&[], &store()).is_empty());
    }
}
