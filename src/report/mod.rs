//! Reporting: per-day lines, overview block and sector detail.

pub mod format;

pub use format::*;
