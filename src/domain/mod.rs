//! Domain types shared by the three tools.
//!
//! This module defines:
//!
//! - exact big-integer quantities (`TokenAmount`, `DealWeight`, `Fil`)
//! - actor addresses and CIDs
//! - sector, deal and tipset records as returned by the node

pub mod address;
pub mod cid;
pub mod token;
pub mod types;

pub use address::*;
pub use cid::*;
pub use token::*;
pub use types::*;
