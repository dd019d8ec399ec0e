//! Configuration management for linkchain

use crate::blockchain::{Chain, Difficulty};
use crate::error::ChainError;
use crate::miner::{ParallelSealer, Sealer, SequentialSealer, DEFAULT_BATCH_SIZE};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "linkchain.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub sealer: SealerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SealerConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for SealerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            batch_size: default_batch_size(),
            timeout_secs: None,
        }
    }
}

fn default_threads() -> usize {
    1
}

fn default_batch_size() -> u64 {
    DEFAULT_BATCH_SIZE
}

impl SealerConfig {
    /// Sequential search for one thread, the rayon-backed search otherwise.
    pub fn build(&self) -> Result<Arc<dyn Sealer>, ChainError> {
        let timeout = self.timeout_secs.map(Duration::from_secs);
        if self.threads <= 1 {
            let mut sealer = SequentialSealer::new();
            if let Some(timeout) = timeout {
                sealer = sealer.with_timeout(timeout);
            }
            return Ok(Arc::new(sealer));
        }

        let mut sealer = ParallelSealer::new(self.threads)?.with_batch_size(self.batch_size);
        if let Some(timeout) = timeout {
            sealer = sealer.with_timeout(timeout);
        }
        Ok(Arc::new(sealer))
    }
}

impl LedgerConfig {
    /// Empty chain configured from these settings.
    pub fn build_chain(&self) -> Result<Chain, ChainError> {
        Ok(Chain::with_sealer(self.chain.difficulty, self.sealer.build()?))
    }
}

/// Load configuration from `path`, falling back to defaults when the file is absent.
pub fn load_config(path: impl AsRef<Path>) -> Result<LedgerConfig, ChainError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(LedgerConfig::default());
    }

    let config_str = fs::read_to_string(path)?;
    let config: LedgerConfig = toml::from_str(&config_str)?;

    if config.sealer.batch_size == 0 {
        return Err(ChainError::Config("sealer.batch_size must be greater than zero".to_string()));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config("/nonexistent/linkchain.toml").unwrap();
        assert_eq!(config.chain.difficulty, Difficulty::default());
        assert_eq!(config.sealer.threads, 1);
        assert_eq!(config.sealer.batch_size, DEFAULT_BATCH_SIZE);
        assert!(config.sealer.timeout_secs.is_none());
    }

    #[test]
    fn test_parse_full_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            "[chain]\ndifficulty = 2\n\n[sealer]\nthreads = 4\nbatch_size = 500\ntimeout_secs = 30"
        )?;

        let config = load_config(file.path())?;
        assert_eq!(config.chain.difficulty.zeros(), 2);
        assert_eq!(config.sealer.threads, 4);
        assert_eq!(config.sealer.batch_size, 500);
        assert_eq!(config.sealer.timeout_secs, Some(30));

        let chain = config.build_chain()?;
        assert_eq!(chain.difficulty().zeros(), 2);
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[sealer]\nthreads = 2")?;

        let config = load_config(file.path())?;
        assert_eq!(config.chain.difficulty, Difficulty::default());
        assert_eq!(config.sealer.threads, 2);
        Ok(())
    }

    #[test]
    fn test_invalid_difficulty_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[chain]\ndifficulty = 0")?;

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ChainError::Config(_)));
        Ok(())
    }

    #[test]
    fn test_zero_batch_size_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[sealer]\nbatch_size = 0")?;

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
        Ok(())
    }
}
