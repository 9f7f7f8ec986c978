//! `sector-pledge` library crate.
//!
//! The three binaries (`sector-report`, `sector-daily`, `rebuild-tool`) are
//! thin wrappers around this library so that:
//!
//! - chain access sits behind the `ChainApi` trait and can be faked in tests
//! - classification, aggregation and formatting are testable without a node

pub mod app;
pub mod chain;
pub mod cli;
pub mod clock;
pub mod domain;
pub mod error;
pub mod logging;
pub mod rebuild;
pub mod report;
pub mod sectors;
pub mod store;
