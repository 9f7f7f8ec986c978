//! Epoch-time conversion.

pub mod epoch;
pub mod zone;

pub use epoch::*;
pub use zone::*;
