//! Input/output helpers.
//!
//! - CSV ingest + normalization (`ingest`)
//! - comparison CSV export (`export`)
//! - comparison JSON export (`snapshot`)

pub mod export;
pub mod ingest;
pub mod snapshot;

pub use export::*;
pub use ingest::*;
pub use snapshot::*;
