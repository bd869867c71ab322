//! `policy-rates` library crate.
//!
//! The binary (`rates`) is a thin wrapper around this library so that:
//!
//! - the store, timeline, selection and resolver are testable without a terminal
//! - the CLI and the TUI share one session pipeline
//!
//! Data flow: sources -> [`store::SeriesStore`] -> [`timeline::Timeline`];
//! per interaction: [`selection::apply_selection`] -> [`resolve::resolve`] ->
//! [`resolve::markers`].

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod log;
pub mod plot;
pub mod report;
pub mod resolve;
pub mod selection;
pub mod store;
pub mod timeline;
pub mod tui;
