//! Interactive CSV picker for series that were not given on the command line.
//!
//! clap handles the structured flags; this module covers running `rates` with
//! no paths and choosing the two CSV downloads from the working directory.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Default directory recursion depth for finding CSV files.
const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Prompt on stdin/stdout for the CSV holding series `label`.
///
/// Accepts a number from the listed files or an explicit path; `q` cancels.
pub fn prompt_for_csv_path(label: &str) -> Result<PathBuf, AppError> {
    let files = discover_csv_files();
    let stdin = io::stdin();
    let stdout = io::stdout();
    pick_csv_path(label, &files, &mut stdin.lock(), &mut stdout.lock())
}

fn pick_csv_path<R: BufRead, W: Write>(
    label: &str,
    files: &[PathBuf],
    input: &mut R,
    out: &mut W,
) -> Result<PathBuf, AppError> {
    let write_err = |e: io::Error| AppError::new(2, format!("Failed to write prompt: {e}"));

    if files.is_empty() {
        writeln!(out, "No .csv files found under the current directory.").map_err(write_err)?;
    } else {
        writeln!(out, "Found {} CSV file(s):", files.len()).map_err(write_err)?;
        for (idx, path) in files.iter().enumerate() {
            writeln!(out, "{:>3}) {}", idx + 1, pretty_path(path)).map_err(write_err)?;
        }
    }

    loop {
        if files.is_empty() {
            write!(out, "CSV for {label} (path, q to quit): ").map_err(write_err)?;
        } else {
            write!(out, "CSV for {label} (1-{} or a path, q to quit): ", files.len()).map_err(write_err)?;
        }
        out.flush().map_err(write_err)?;

        let mut line = String::new();
        let bytes = input
            .read_line(&mut line)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;
        if bytes == 0 {
            return Err(AppError::new(
                2,
                format!("No input received. Provide the {label} series with a CSV path flag or --demo."),
            ));
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }
        if line.is_empty() {
            continue;
        }

        if let Ok(choice) = line.parse::<usize>() {
            if (1..=files.len()).contains(&choice) {
                return validate_csv_path(&files[choice - 1]);
            }
            writeln!(out, "Invalid choice: {choice}.").map_err(write_err)?;
            continue;
        }

        match validate_csv_path(Path::new(line)) {
            Ok(path) => return Ok(path),
            Err(err) => writeln!(out, "{err}").map_err(write_err)?,
        }
    }
}

/// Validate the provided path points to an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(2, format!("CSV file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if !has_csv_extension(path) {
        return Err(AppError::new(
            2,
            format!("Expected a .csv file (got: {}).", path.display()),
        ));
    }

    Ok(path.to_path_buf())
}

/// Discover `*.csv` files under the current directory (deterministic order).
pub fn discover_csv_files() -> Vec<PathBuf> {
    find_csv_files(Path::new("."), DEFAULT_SEARCH_DEPTH)
}

fn find_csv_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_csv_files_inner(root, 0, max_depth, &mut out);
    out.sort_by_key(|p| pretty_path(p));
    out
}

fn find_csv_files_inner(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if !should_skip_dir(&path) {
                find_csv_files_inner(&path, depth + 1, max_depth, out);
            }
        } else if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_csvs_recursively_and_skips_target() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fed.CSV"), "DATE,RATE\n").unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/ecb.csv"), "DATE,RATE\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target/skip.csv"), "").unwrap();

        let found = find_csv_files(dir.path(), DEFAULT_SEARCH_DEPTH);
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"fed.CSV".to_string()));
        assert!(names.contains(&"ecb.csv".to_string()));
    }

    #[test]
    fn validate_rejects_missing_dirs_and_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("rates.txt");
        fs::write(&txt, "").unwrap();

        assert!(validate_csv_path(&dir.path().join("nope.csv")).is_err());
        assert!(validate_csv_path(dir.path()).is_err());
        assert!(validate_csv_path(&txt).is_err());
    }

    #[test]
    fn picks_by_number_after_an_invalid_choice() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("fed.csv");
        fs::write(&csv, "DATE,RATE\n").unwrap();

        let mut input = io::Cursor::new("9\n1\n");
        let mut out = Vec::new();
        let picked = pick_csv_path("FED", std::slice::from_ref(&csv), &mut input, &mut out).unwrap();

        assert_eq!(picked, csv);
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("Invalid choice: 9."));
        assert!(shown.contains("CSV for FED"));
    }

    #[test]
    fn eof_and_quit_cancel() {
        let mut out = Vec::new();
        let err = pick_csv_path("ECB", &[], &mut io::Cursor::new(""), &mut out).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = pick_csv_path("ECB", &[], &mut io::Cursor::new("q\n"), &mut out).unwrap_err();
        assert_eq!(err.message(), "Canceled.");
    }
}
