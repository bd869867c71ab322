//! Deterministic synthetic policy-rate series.
//!
//! Lets `rates` run without any data files. Two step paths are generated from
//! one seed: a monthly series (A, FEDFUNDS-like) and a sparser series (B) that is
//! observed on a six-weekly meeting calendar plus the first day of each quarter.
//! The two calendars only partly overlap, so the merged timeline has gaps on
//! both sides, which is the interesting case for point lookup.

use chrono::{Datelike, Duration, Months, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::AppError;

/// Policy rates move in quarter-point steps.
const STEP: f64 = 0.25;
/// A shock beyond this many standard deviations triggers a move.
const MOVE_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct DemoData {
    pub a: Vec<(NaiveDate, f64)>,
    pub b: Vec<(NaiveDate, f64)>,
}

/// Generate `months` months of data starting at `start`.
pub fn generate(seed: u64, start: NaiveDate, months: u32) -> Result<DemoData, AppError> {
    if months == 0 {
        return Err(AppError::new(2, "Demo data needs at least one month."));
    }
    let end = start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| AppError::new(2, "Demo date range overflows the calendar."))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let a_dates = monthly_dates(start, months);
    let b_dates = meeting_dates(start, end);

    Ok(DemoData {
        a: step_path(&mut rng, &normal, &a_dates, 5.25, 0.0),
        b: step_path(&mut rng, &normal, &b_dates, 4.00, -0.50),
    })
}

fn monthly_dates(start: NaiveDate, months: u32) -> Vec<NaiveDate> {
    let first = start.with_day(1).unwrap_or(start);
    (0..months)
        .filter_map(|i| first.checked_add_months(Months::new(i)))
        .collect()
}

fn meeting_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();

    let mut meeting = start.checked_add_signed(Duration::days(10));
    while let Some(date) = meeting.filter(|d| *d < end) {
        out.push(date);
        meeting = date.checked_add_signed(Duration::weeks(6));
    }

    let first = start.with_day(1).unwrap_or(start);
    let mut quarter = first;
    while quarter < end {
        out.push(quarter);
        match quarter.checked_add_months(Months::new(3)) {
            Some(next) => quarter = next,
            None => break,
        }
    }

    out.sort_unstable();
    out.dedup();
    out
}

fn step_path(
    rng: &mut StdRng,
    normal: &Normal<f64>,
    dates: &[NaiveDate],
    start_level: f64,
    floor: f64,
) -> Vec<(NaiveDate, f64)> {
    let mut level = start_level;
    let mut out = Vec::with_capacity(dates.len());
    for &date in dates {
        let shock = normal.sample(rng);
        if shock > MOVE_THRESHOLD {
            level += STEP;
        } else if shock < -MOVE_THRESHOLD {
            level -= STEP;
        }
        level = level.max(floor);
        out.push((date, (level * 100.0).round() / 100.0));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn same_seed_same_data() {
        let a = generate(7, d(2020, 1, 1), 24).unwrap();
        let b = generate(7, d(2020, 1, 1), 24).unwrap();
        assert_eq!(a.a, b.a);
        assert_eq!(a.b, b.b);
    }

    #[test]
    fn calendars_partly_overlap() {
        let data = generate(1, d(2020, 1, 1), 12).unwrap();
        assert_eq!(data.a.len(), 12);
        assert_eq!(data.a[0].0, d(2020, 1, 1));

        let b_dates: Vec<_> = data.b.iter().map(|(d, _)| *d).collect();
        assert!(b_dates.contains(&d(2020, 1, 1)));
        assert!(b_dates.contains(&d(2020, 1, 11)));
        assert!(!b_dates.contains(&d(2020, 2, 1)));
        assert!(b_dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn rates_move_in_steps_and_respect_floor() {
        let data = generate(99, d(2010, 1, 1), 120).unwrap();
        for (_, rate) in &data.a {
            assert!(*rate >= 0.0);
            let steps = rate / STEP;
            assert!((steps - steps.round()).abs() < 1e-9);
        }
        assert!(data.b.iter().all(|(_, r)| *r >= -0.50));
    }

    #[test]
    fn zero_months_is_rejected() {
        assert_eq!(generate(1, d(2020, 1, 1), 0).unwrap_err().exit_code(), 2);
    }
}
