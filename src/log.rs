//! Logging initialization.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies. Logs go to
/// stderr so stdout stays clean for tables and exports.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (e.g. from tests) is not an error worth surfacing.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .with(filter)
        .try_init();
}

/// Default level for a run: `debug` when verbose, otherwise `warn`, or nothing
/// at all while the TUI owns the terminal.
pub fn default_level(verbose: bool, interactive: bool) -> &'static str {
    match (verbose, interactive) {
        (true, _) => "debug",
        (false, true) => "off",
        (false, false) => "warn",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tui_is_silent_unless_verbose() {
        assert_eq!(default_level(false, true), "off");
        assert_eq!(default_level(true, true), "debug");
        assert_eq!(default_level(false, false), "warn");
    }
}
