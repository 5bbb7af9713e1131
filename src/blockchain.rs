// Thin re-export module: the block record, the chain container and the
// linkage checks live in their own files under `blockchain/`.

pub mod block;
pub mod chain;
pub mod validation;

pub use block::*;
pub use chain::*;
pub use validation::*;
