//! Chain client: the `ChainApi` seam, its JSON-RPC implementation, and
//! randomness helpers built on top of it.

pub mod api;
pub mod lotus;
pub mod randomness;
#[cfg(test)]
pub mod testing;

pub use api::*;
pub use lotus::*;
pub use randomness::*;
