//! CSV ingest and normalization.
//!
//! This module is responsible for turning a central-bank CSV export into clean
//! `(date, rate)` rows that the series store can take as-is.
//!
//! Real exports are messy in a few recurring ways, all handled here and nowhere else:
//! - a UTF-8 BOM or stray whitespace on header names
//! - metadata lines above the real header (ECB Data Portal downloads)
//! - non-UTF-8 bytes (Latin-1 titles)
//! - unrecognized header names, where we fall back to column position
//!
//! Rows that fail to parse are dropped and reported as [`RowError`]s; they never
//! reach the store.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::ByteRecord;
use tracing::{debug, info};

use crate::error::AppError;

/// How many leading records we scan for a recognizable header.
const MAX_PREAMBLE_LINES: usize = 20;

const DATE_HEADERS: [&str; 5] = ["date", "observation_date", "time_period", "time period", "period"];
const RATE_HEADERS: [&str; 5] = ["rate", "value", "obs_value", "obs. value", "fedfunds"];

/// How the date/rate columns were located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnResolution {
    /// Both columns were found by (normalized) header name.
    ByName { date: String, rate: String },
    /// No recognizable header; the first two columns were used.
    ByPosition,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: normalized rows + diagnostics.
#[derive(Debug, Clone)]
pub struct LoadedRows {
    /// Rows in file order. Duplicate dates are left for the store to collapse.
    pub rows: Vec<(NaiveDate, f64)>,
    pub columns: ColumnResolution,
    /// Lines skipped above the header.
    pub preamble_lines: usize,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl LoadedRows {
    pub fn rows_used(&self) -> usize {
        self.rows.len()
    }
}

/// Load `(date, rate)` rows from a CSV file.
///
/// `rate_column` forces the rate column by header name (case-insensitive).
pub fn load_rate_rows(path: &Path, rate_column: Option<&str>) -> Result<LoadedRows, AppError> {
    let mut file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| AppError::new(2, format!("Failed to read CSV '{}': {e}", path.display())))?;

    let loaded = parse_rate_rows(&bytes, rate_column)?;
    info!(
        path = %path.display(),
        rows_read = loaded.rows_read,
        rows_used = loaded.rows_used(),
        dropped = loaded.row_errors.len(),
        preamble = loaded.preamble_lines,
        "ingested CSV"
    );
    Ok(loaded)
}

/// Parse CSV bytes into `(date, rate)` rows. See [`load_rate_rows`].
pub fn parse_rate_rows(bytes: &[u8], rate_column: Option<&str>) -> Result<LoadedRows, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut records = reader.byte_records().enumerate();

    // Find the header among the first few records. A record naming both a date
    // and a rate column wins outright. A record with only a date column is a
    // weaker candidate (metadata lines like `"Period","Daily"` look the same);
    // among those, the first one whose next record parses as data is taken.
    // If nothing is recognized, the very first record is the header and columns
    // are taken by position.
    let mut scanned: Vec<(usize, ByteRecord)> = Vec::new();
    let mut header: Option<(usize, HeaderMatch)> = None;
    let mut weak: Vec<(usize, HeaderMatch)> = Vec::new();
    for (idx, result) in records.by_ref() {
        let record = match result {
            Ok(r) => r,
            Err(e) => return Err(AppError::new(2, format!("Failed to read CSV header: {e}"))),
        };
        let candidate = resolve_columns(&build_header_map(&record), rate_column);
        scanned.push((idx, record));
        match candidate {
            Some(found) if found.rate_named => {
                header = Some((scanned.len() - 1, found));
                break;
            }
            Some(found) => weak.push((scanned.len() - 1, found)),
            None => {}
        }
        if scanned.len() >= MAX_PREAMBLE_LINES {
            break;
        }
    }

    let header = header.or_else(|| pick_weak_header(&scanned, weak));

    let mut pending: Vec<(usize, ByteRecord)> = Vec::new();
    let (header_line, date_idx, rate_idx, columns) = match header {
        Some((pos, found)) => {
            let (idx, record) = &scanned[pos];
            let line = line_of(record, *idx);
            // Records scanned past the header are data rows.
            pending.extend(scanned.drain(pos + 1..));
            (line, found.date_idx, found.rate_idx, found.columns)
        }
        None => {
            if let Some(name) = rate_column {
                return Err(AppError::new(
                    2,
                    format!("Rate column `{name}` was not found in the CSV header."),
                ));
            }
            let Some((first_idx, first)) = scanned.first() else {
                return Err(AppError::new(2, "CSV file is empty."));
            };
            let first_line = line_of(first, *first_idx);
            debug!("no recognized header; using columns by position");
            pending.extend(scanned.drain(..).skip(1));
            (first_line, 0, 1, ColumnResolution::ByPosition)
        }
    };

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    let pending = pending.into_iter().map(|(idx, r)| (idx, Ok::<_, csv::Error>(r)));
    for (idx, result) in pending.chain(records) {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                rows_read += 1;
                let line = e.position().map(|p| p.line() as usize).unwrap_or(idx + 1);
                push_error(&mut row_errors, line, format!("CSV parse error: {e}"));
                continue;
            }
        };
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        rows_read += 1;

        let line = line_of(&record, idx);
        match parse_row(&record, date_idx, rate_idx) {
            Ok(row) => rows.push(row),
            Err(message) => push_error(&mut row_errors, line, message),
        }
    }

    Ok(LoadedRows {
        rows,
        columns,
        preamble_lines: header_line.saturating_sub(1),
        row_errors,
        rows_read,
    })
}

/// 1-based line where `record` starts (records can span lines or follow blank ones).
fn line_of(record: &ByteRecord, idx: usize) -> usize {
    record
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(idx + 1)
}

fn push_error(errors: &mut Vec<RowError>, line: usize, message: String) {
    debug!(line, %message, "dropping CSV row");
    errors.push(RowError { line, message });
}

fn field(record: &ByteRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .map(|raw| String::from_utf8_lossy(raw).trim().to_string())
        .filter(|s| !s.is_empty())
}

fn build_header_map(record: &ByteRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, raw) in record.iter().enumerate() {
        // Keep the first occurrence of a name.
        map.entry(normalize_header_name(&String::from_utf8_lossy(raw)))
            .or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "\u{feff}DATE"). If we don't strip it, column
    // detection fails and we silently fall back to position.
    let name = name.trim().trim_start_matches('\u{feff}').trim();
    name.to_ascii_lowercase()
}

/// Date/rate columns located in a candidate header record.
#[derive(Debug)]
struct HeaderMatch {
    date_idx: usize,
    rate_idx: usize,
    columns: ColumnResolution,
    /// The rate column was named (known alias or explicit override), not guessed.
    rate_named: bool,
}

/// Find the date and rate columns in a candidate header record.
///
/// Returns `None` when the record does not look like a header at all, or when
/// an explicit rate column is requested and this record does not carry it.
fn resolve_columns(header_map: &HashMap<String, usize>, rate_column: Option<&str>) -> Option<HeaderMatch> {
    let (date_name, date_idx) = DATE_HEADERS
        .iter()
        .find_map(|name| header_map.get(*name).map(|idx| (name.to_string(), *idx)))?;

    let named = match rate_column {
        Some(wanted) => {
            let wanted = normalize_header_name(wanted);
            let idx = *header_map.get(&wanted)?;
            Some((wanted, idx))
        }
        None => RATE_HEADERS
            .iter()
            .find_map(|name| header_map.get(*name).map(|idx| (name.to_string(), *idx))),
    };
    let rate_named = named.is_some();

    // A date header without a known rate header: take the first column that
    // is not itself a date/period column.
    let (rate_name, rate_idx) = match named {
        Some(found) => found,
        None => header_map
            .iter()
            .filter(|(name, idx)| **idx != date_idx && !DATE_HEADERS.contains(&name.as_str()))
            .min_by_key(|(_, idx)| **idx)
            .map(|(name, idx)| (name.clone(), *idx))?,
    };

    Some(HeaderMatch {
        date_idx,
        rate_idx,
        columns: ColumnResolution::ByName {
            date: date_name,
            rate: rate_name,
        },
        rate_named,
    })
}

/// Choose among date-only header candidates: the first one followed by a
/// parseable data row, else the first one.
fn pick_weak_header(
    scanned: &[(usize, ByteRecord)],
    weak: Vec<(usize, HeaderMatch)>,
) -> Option<(usize, HeaderMatch)> {
    let confirmed = weak.iter().position(|(pos, found)| {
        scanned
            .get(pos + 1)
            .is_some_and(|(_, next)| parse_row(next, found.date_idx, found.rate_idx).is_ok())
    });
    let choice = confirmed.unwrap_or(0);
    if confirmed.is_none() && weak.len() > 1 {
        debug!(candidates = weak.len(), "no header candidate is followed by data; using the first");
    }
    weak.into_iter().nth(choice)
}

fn parse_row(record: &ByteRecord, date_idx: usize, rate_idx: usize) -> Result<(NaiveDate, f64), String> {
    let date_raw = field(record, date_idx).ok_or_else(|| "Missing date value".to_string())?;
    let rate_raw = field(record, rate_idx).ok_or_else(|| "Missing rate value".to_string())?;
    let date = parse_date(&date_raw)?;
    let rate = parse_rate(&rate_raw).ok_or_else(|| format!("Invalid rate '{rate_raw}'"))?;
    Ok((date, rate))
}

/// Parse a calendar date in one of the formats seen in central-bank exports.
///
/// Monthly periods (`YYYY-MM`) map to the first day of the month.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
    // Some exports carry a time component ("2024-01-01 00:00:00"); only the date matters.
    let date_part = s.split(['T', ' ']).next().unwrap_or(s);
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, fmt) {
            return Ok(d);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{date_part}-01"), "%Y-%m-%d") {
        return Ok(d);
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, DD/MM/YYYY, DD-MM-YYYY, YYYY-MM."
    ))
}

/// Parse a rate in percent. `.`, `NaN`, `NA` and non-finite values are missing.
pub fn parse_rate(s: &str) -> Option<f64> {
    let trimmed = s.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() || trimmed == "." || trimmed.eq_ignore_ascii_case("na") {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn fred_style_csv_with_bom() {
        let csv = "\u{feff}DATE,FEDFUNDS\n2024-01-01,5.33\n2024-02-01,.\n2024-03-01,5.33\n";
        let loaded = parse_rate_rows(csv.as_bytes(), None).unwrap();

        assert_eq!(
            loaded.columns,
            ColumnResolution::ByName {
                date: "date".to_string(),
                rate: "fedfunds".to_string()
            }
        );
        assert_eq!(loaded.rows, vec![(d(2024, 1, 1), 5.33), (d(2024, 3, 1), 5.33)]);
        assert_eq!(loaded.rows_read, 3);
        assert_eq!(loaded.row_errors.len(), 1);
        assert_eq!(loaded.row_errors[0].line, 3);
    }

    #[test]
    fn ecb_style_csv_with_preamble() {
        let csv = concat!(
            "\"ECB Data Portal\"\n",
            "\"Deposit facility - date of changes\"\n",
            "\"Source\",\"ECB\"\n",
            "\n",
            "\"Unit\",\"Percent\"\n",
            "\"DATE\",\"TIME PERIOD\",\"Deposit facility (FM.D.U2.EUR.4F.KR.DFR.LEV)\"\n",
            "\"2024-06-12\",\"12 Jun 2024\",\"3.75\"\n",
            "\"2023-09-20\",\"20 Sep 2023\",\"4.00\"\n",
        );
        let loaded = parse_rate_rows(csv.as_bytes(), None).unwrap();

        assert_eq!(loaded.preamble_lines, 5);
        assert_eq!(loaded.rows, vec![(d(2024, 6, 12), 3.75), (d(2023, 9, 20), 4.00)]);
        assert!(loaded.row_errors.is_empty());
    }

    #[test]
    fn metadata_line_with_a_period_cell_is_not_the_header() {
        let csv = concat!(
            "\"Title\",\"Main refinancing operations\"\n",
            "\"Period\",\"Daily\"\n",
            "\"DATE\",\"TIME PERIOD\",\"Main refinancing operations - Level\"\n",
            "\"2024-06-12\",\"12 Jun 2024\",\"4.25\"\n",
            "\"2023-09-20\",\"20 Sep 2023\",\"4.50\"\n",
        );
        let loaded = parse_rate_rows(csv.as_bytes(), None).unwrap();

        assert_eq!(
            loaded.columns,
            ColumnResolution::ByName {
                date: "date".to_string(),
                rate: "main refinancing operations - level".to_string()
            }
        );
        assert_eq!(loaded.preamble_lines, 2);
        assert_eq!(loaded.rows, vec![(d(2024, 6, 12), 4.25), (d(2023, 9, 20), 4.50)]);
        assert!(loaded.row_errors.is_empty());
    }

    #[test]
    fn named_rate_column_beats_an_earlier_date_only_line() {
        let csv = "Period,Monthly\nobservation_date,FEDFUNDS\n2024-01-01,5.33\n";
        let loaded = parse_rate_rows(csv.as_bytes(), None).unwrap();
        assert_eq!(loaded.rows, vec![(d(2024, 1, 1), 5.33)]);
        assert_eq!(loaded.rows_read, 1);
    }

    #[test]
    fn explicit_rate_column_wins() {
        let csv = "TIME_PERIOD,OBS_VALUE,OBS_STATUS,OTHER\n2024-01,4.00,A,9\n";
        let loaded = parse_rate_rows(csv.as_bytes(), Some("OTHER")).unwrap();
        assert_eq!(loaded.rows, vec![(d(2024, 1, 1), 9.0)]);

        let err = parse_rate_rows(csv.as_bytes(), Some("missing")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn unrecognized_header_falls_back_to_position() {
        let csv = "when,how much\n2024-01-01,1.5\nnot a date,2.0\n";
        let loaded = parse_rate_rows(csv.as_bytes(), None).unwrap();

        assert_eq!(loaded.columns, ColumnResolution::ByPosition);
        assert_eq!(loaded.rows, vec![(d(2024, 1, 1), 1.5)]);
        assert_eq!(loaded.row_errors.len(), 1);
        assert_eq!(loaded.row_errors[0].line, 3);
    }

    #[test]
    fn latin1_bytes_do_not_abort_the_load() {
        let mut bytes = b"Date,Rate\n2024-01-01,4.5\n".to_vec();
        bytes.extend_from_slice(b"2024-02-01,caf\xe9\n");
        let loaded = parse_rate_rows(&bytes, None).unwrap();
        assert_eq!(loaded.rows, vec![(d(2024, 1, 1), 4.5)]);
        assert_eq!(loaded.row_errors.len(), 1);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse_rate_rows(b"", None).is_err());
    }

    #[test]
    fn parse_date_formats() {
        assert_eq!(parse_date("2024-03-01").unwrap(), d(2024, 3, 1));
        assert_eq!(parse_date("01/03/2024").unwrap(), d(2024, 3, 1));
        assert_eq!(parse_date("2024-03").unwrap(), d(2024, 3, 1));
        assert_eq!(parse_date("2024-03-01 00:00:00").unwrap(), d(2024, 3, 1));
        assert!(parse_date("March 2024").is_err());
    }

    #[test]
    fn parse_rate_missing_markers() {
        assert_eq!(parse_rate("5.33"), Some(5.33));
        assert_eq!(parse_rate("4.5%"), Some(4.5));
        assert_eq!(parse_rate("."), None);
        assert_eq!(parse_rate("NaN"), None);
        assert_eq!(parse_rate("NA"), None);
        assert_eq!(parse_rate("inf"), None);
    }
}
