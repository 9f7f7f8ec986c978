//! Sector rebuild metadata: sealing randomness, pieces and CommR.

pub mod commitment;
pub mod info;

pub use commitment::*;
pub use info::*;
