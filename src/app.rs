//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - loads both series into a session
//! - prints reports/plots or hands the session to the TUI
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, ExportArgs, ShowArgs, SourceArgs, TuiArgs};
use crate::error::AppError;

pub mod pipeline;

use pipeline::{Session, parse_requested_dates};

/// Entry point for the `rates` binary.
pub fn run() -> Result<(), AppError> {
    // `rates` and `rates --fed a.csv ...` behave like `rates tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let interactive = matches!(cli.command, Command::Tui(_));
    crate::log::init_logging(crate::log::default_level(cli.verbose, interactive));

    match cli.command {
        Command::Show(args) => handle_show(args),
        Command::Dates(args) => handle_dates(args),
        Command::Export(args) => handle_export(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let requested = parse_requested_dates(&args.dates)?;
    let mut config = args.sources.to_config(requested)?;
    config.plot = !args.no_plot;
    config.plot_width = args.width;
    config.plot_height = args.height;

    let session = Session::load(&config)?;
    let view = session.interact(&config.requested_dates);
    let ids: Vec<_> = session.store().ids().cloned().collect();

    println!(
        "{}",
        crate::report::format_load_summary(session.reports(), session.timeline())
    );
    println!("{}", crate::report::format_comparison(&view, &ids));

    if config.plot {
        let plot = crate::plot::render_ascii_plot(
            session.store(),
            &view,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    Ok(())
}

fn handle_dates(args: SourceArgs) -> Result<(), AppError> {
    let config = args.to_config(Vec::new())?;
    let session = Session::load(&config)?;
    print!("{}", crate::report::format_timeline(session.timeline()));
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    if args.csv.is_none() && args.json.is_none() {
        return Err(AppError::new(2, "Nothing to export: pass --csv PATH and/or --json PATH."));
    }

    let requested = parse_requested_dates(&args.dates)?;
    let config = args.sources.to_config(requested)?;
    let session = Session::load(&config)?;
    let view = session.interact(&config.requested_dates);
    let ids: Vec<_> = session.store().ids().cloned().collect();

    if let Some(path) = &args.csv {
        crate::io::write_comparison_csv(path, &ids, &view.rows)?;
        info!(path = %path.display(), rows = view.rows.len(), "wrote comparison CSV");
    }
    if let Some(path) = &args.json {
        crate::io::write_comparison_json(path, &session, &view)?;
        info!(path = %path.display(), "wrote comparison JSON");
    }
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let requested = parse_requested_dates(&args.dates)?;
    let config = args.sources.to_config(requested)?;
    // Load before the terminal switches to raw mode so prompts and errors stay readable.
    let session = Session::load(&config)?;
    crate::tui::run(session, config.requested_dates)
}

/// Rewrite argv so `rates` defaults to `rates tui`.
///
/// Rules:
/// - `rates`                      -> `rates tui`
/// - `rates --demo ...`           -> `rates tui --demo ...`
/// - `rates --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "show" | "dates" | "export" | "tui");
    if is_subcommand {
        return argv;
    }

    // A leading flag is a `tui` flag.
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_the_tui() {
        assert_eq!(rewrite_args(argv(&["rates"])), argv(&["rates", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["rates", "--demo", "-d", "2024-01-01"])),
            argv(&["rates", "tui", "--demo", "-d", "2024-01-01"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(rewrite_args(argv(&["rates", "show", "--demo"])), argv(&["rates", "show", "--demo"]));
        assert_eq!(rewrite_args(argv(&["rates", "--help"])), argv(&["rates", "--help"]));
    }
}
