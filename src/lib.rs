//! linkchain - a local proof-of-work ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the chain manager, difficulty rules and validation
//!
//! ## Proof of Work
//! - [`miner`] - Nonce sealing strategies (sequential and rayon-parallel)
//!
//! ## Hashing
//! - [`crypto`] - SHA-256 digests and prefix checks
//!
//! ## Concurrency
//! - [`shared`] - Thread-safe chain handle
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`tamper`] - Deliberate block corruption for exercising validation

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;

// ============================================================================
// Proof of Work
// ============================================================================
pub mod miner;

// ============================================================================
// Hashing
// ============================================================================
pub mod crypto;

// ============================================================================
// Concurrency
// ============================================================================
pub mod shared;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod tamper;

pub use blockchain::{Block, Chain, Defect, Difficulty, ValidationReport};
pub use config::{load_config, LedgerConfig};
pub use error::{ChainError, Result};
pub use miner::{CancelToken, ParallelSealer, Sealer, SequentialSealer};
pub use shared::SharedChain;
pub use tamper::Tamper;
