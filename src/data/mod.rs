//! Non-CSV series sources.
//!
//! - FRED API downloads (`fred`)
//! - deterministic demo data (`demo`)

pub mod demo;
pub mod fred;

pub use fred::FredClient;
