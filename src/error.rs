//! Error types for linkchain

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Cannot append to an empty chain; create the genesis block first")]
    MissingGenesis,
    #[error("Block not found: #{0}")]
    BlockNotFound(u64),
    #[error("Invalid difficulty {0}: expected a value between 1 and 64")]
    InvalidDifficulty(u32),
    #[error("Invalid block: {0}")]
    InvalidBlock(String),
    #[error("Sealing of block #{index} aborted after {attempts} attempts")]
    SealAborted { index: u64, attempts: u64 },
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
