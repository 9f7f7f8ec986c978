//! Sector classification, per-day aggregation and expandability.

pub mod aggregate;
pub mod classify;
pub mod expand;

pub use aggregate::*;
pub use classify::*;
pub use expand::*;
