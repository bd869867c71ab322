//! Timeline merging: the union of every loaded series' dates.

use chrono::NaiveDate;

use crate::domain::Series;
use crate::store::SeriesStore;

/// Strictly ascending, duplicate-free union of the dates of `series`.
pub fn merge<'a>(series: impl IntoIterator<Item = &'a Series>) -> Vec<NaiveDate> {
    merge_date_sets(series.into_iter().map(|s| s.dates().collect()))
}

/// Same union over plain date lists, e.g. from [`SeriesStore::all_dates`].
pub fn merge_date_sets(sets: impl IntoIterator<Item = Vec<NaiveDate>>) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = sets.into_iter().flatten().collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// The selectable date domain for the current store contents.
///
/// Derived, never cached across a reload: rebuild it with
/// [`Timeline::from_store`] whenever a series changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    dates: Vec<NaiveDate>,
}

impl Timeline {
    pub fn from_store(store: &SeriesStore) -> Self {
        Self {
            dates: merge_date_sets(store.ids().map(|id| store.all_dates(id))),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.binary_search(&date).is_ok()
    }

    /// Position of `date` in the timeline, if present.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesId;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn merge_unions_and_dedups() {
        let (a, _) = Series::from_rows(
            SeriesId::new("FED"),
            vec![(d(2024, 1, 1), 5.33), (d(2024, 2, 1), 5.33), (d(2024, 3, 1), 5.50)],
        );
        let (b, _) = Series::from_rows(
            SeriesId::new("ECB"),
            vec![(d(2024, 1, 1), 4.50), (d(2024, 3, 1), 4.75)],
        );

        assert_eq!(
            merge([&a, &b]),
            vec![d(2024, 1, 1), d(2024, 2, 1), d(2024, 3, 1)]
        );
    }

    #[test]
    fn timeline_tracks_reloads() {
        let mut store = SeriesStore::new();
        let fed = SeriesId::new("FED");
        store.load(fed.clone(), vec![(d(2024, 1, 1), 5.33)]).unwrap();
        assert!(Timeline::from_store(&store).contains(d(2024, 1, 1)));

        store.load(fed, vec![(d(2024, 6, 1), 5.33)]).unwrap();
        let timeline = Timeline::from_store(&store);
        assert!(!timeline.contains(d(2024, 1, 1)));
        assert_eq!(timeline.dates(), &[d(2024, 6, 1)]);
    }

    #[test]
    fn store_timeline_is_the_union_of_all_dates() {
        let mut store = SeriesStore::new();
        let fed = SeriesId::new("FED");
        let ecb = SeriesId::new("ECB");
        store
            .load(fed.clone(), vec![(d(2024, 3, 1), 5.50), (d(2024, 1, 1), 5.33)])
            .unwrap();
        store
            .load(ecb.clone(), vec![(d(2024, 1, 1), 4.50), (d(2024, 2, 15), 4.50)])
            .unwrap();

        let timeline = Timeline::from_store(&store);
        assert_eq!(
            timeline.dates(),
            merge_date_sets([store.all_dates(&fed), store.all_dates(&ecb)]).as_slice()
        );
        assert_eq!(
            timeline.dates(),
            &[d(2024, 1, 1), d(2024, 2, 15), d(2024, 3, 1)]
        );
    }

    #[test]
    fn empty_store_has_empty_timeline() {
        let timeline = Timeline::from_store(&SeriesStore::new());
        assert!(timeline.is_empty());
        assert_eq!(timeline.first(), None);
    }
}
