//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - series identity and observations (`SeriesId`, `RatePoint`, `Series`)
//! - selection and resolution outputs (`SelectionOutcome`, `ComparisonRow`, `MarkerPoint`)
//! - run configuration (`DashboardConfig`, `SourceSpec`)

pub mod types;

pub use types::*;
