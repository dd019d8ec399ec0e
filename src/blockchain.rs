// Thin re-export module: implementation is in `blockchain/core.rs`, split into
// block/chain management, difficulty rules and validation.

pub mod core;
pub use core::*;
