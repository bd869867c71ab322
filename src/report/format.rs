//! Formatted terminal output: load summary, timeline listing, comparison table.
//!
//! We keep formatting code in one place so:
//! - the store/resolver code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::{LoadReport, View};
use crate::domain::{MAX_SELECTED_DATES, SeriesId};
use crate::timeline::Timeline;

/// Placeholder for a series without an observation on a selected date.
pub const ABSENT: &str = "—";

/// Format a rate as a percentage with two decimals, or the absence placeholder.
pub fn fmt_rate(rate: Option<f64>) -> String {
    match rate {
        Some(v) => format!("{v:.2}%"),
        None => ABSENT.to_string(),
    }
}

/// Per-series load diagnostics.
pub fn format_load_summary(reports: &[LoadReport], timeline: &Timeline) -> String {
    let mut out = String::new();

    out.push_str("=== rates - policy rate comparison ===\n");
    for r in reports {
        let range = match (r.first, r.last) {
            (Some(first), Some(last)) => format!("{first} .. {last}"),
            _ => "-".to_string(),
        };
        out.push_str(&format!(
            "{:<6} {:<32} read={} dropped={} dup={} points={} [{range}]\n",
            r.id.as_str(),
            truncate(&r.source, 32),
            r.rows_read,
            r.rows_dropped + r.build.non_finite,
            r.build.duplicates,
            r.points,
        ));
    }

    match (timeline.first(), timeline.last()) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "Timeline: {} dates ({first} .. {last})\n",
            timeline.len()
        )),
        _ => out.push_str("Timeline: empty\n"),
    }

    out
}

/// The selectable dates, one per line.
pub fn format_timeline(timeline: &Timeline) -> String {
    let mut out = String::with_capacity(timeline.len() * 11);
    for date in timeline.dates() {
        out.push_str(&date.to_string());
        out.push('\n');
    }
    out
}

/// The comparison table for one interaction pass.
pub fn format_comparison(view: &View, series: &[SeriesId]) -> String {
    let mut out = String::new();

    if view.selection.truncated {
        out.push_str(&format!(
            "warning: only {MAX_SELECTED_DATES} dates can be selected; extra dates were ignored.\n"
        ));
    }
    if view.rows.is_empty() {
        out.push_str("No dates selected. Pass --date YYYY-MM-DD (up to 4).\n");
        return out;
    }

    let mut header = format!("{:<12}", "date");
    for id in series {
        header.push_str(&format!(" {:>10}", truncate(id.as_str(), 10)));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    let mut rule = format!("{:-<12}", "");
    for _ in series {
        rule.push_str(&format!(" {:-<10}", ""));
    }
    out.push_str(&rule);
    out.push('\n');

    for row in &view.rows {
        let mut line = format!("{:<12}", row.date.to_string());
        for id in series {
            line.push_str(&format!(" {:>10}", fmt_rate(row.rate_for(id))));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::Session;
    use crate::store::SeriesStore;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn session() -> Session {
        let mut store = SeriesStore::new();
        store
            .load(
                SeriesId::new("FED"),
                vec![(d(2024, 1, 1), 5.33), (d(2024, 2, 1), 5.33), (d(2024, 3, 1), 5.50)],
            )
            .unwrap();
        store
            .load(SeriesId::new("ECB"), vec![(d(2024, 1, 1), 4.50), (d(2024, 3, 1), 4.75)])
            .unwrap();
        Session::from_store(store)
    }

    #[test]
    fn fmt_rate_placeholder() {
        assert_eq!(fmt_rate(Some(5.5)), "5.50%");
        assert_eq!(fmt_rate(None), "—");
    }

    #[test]
    fn comparison_table_snapshot() {
        let session = session();
        let ids: Vec<_> = session.store().ids().cloned().collect();
        let view = session.interact(&[d(2024, 2, 1), d(2024, 3, 1)]);

        let expected = concat!(
            "date                FED        ECB\n",
            "------------ ---------- ----------\n",
            "2024-02-01        5.33%          —\n",
            "2024-03-01        5.50%      4.75%\n",
        );
        assert_eq!(format_comparison(&view, &ids), expected);
    }

    #[test]
    fn comparison_warns_on_truncation() {
        let session = session();
        let ids: Vec<_> = session.store().ids().cloned().collect();
        let requested: Vec<_> = (1..=5).map(|m| d(2024, m, 1)).collect();
        let txt = format_comparison(&session.interact(&requested), &ids);
        assert!(txt.starts_with("warning: only 4 dates"));
        assert_eq!(txt.lines().count(), 1 + 2 + 4);
    }

    #[test]
    fn timeline_listing() {
        let session = session();
        assert_eq!(
            format_timeline(session.timeline()),
            "2024-01-01\n2024-02-01\n2024-03-01\n"
        );
    }
}
