//! Thread-safe handle around a [`Chain`].
//!
//! Appends are serialized, and the expensive nonce search runs with no chain
//! lock held, so readers and validators are never blocked by sealing.

use crate::blockchain::{Block, Chain, ValidationReport, validate_blocks};
use crate::error::ChainError;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SharedChain {
    chain: Arc<RwLock<Chain>>,
    append_lock: Arc<Mutex<()>>,
}

impl SharedChain {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain: Arc::new(RwLock::new(chain)),
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn create_genesis(&self) -> Result<Block, ChainError> {
        let _guard = self.append_lock.lock();
        let (candidate, sealer, difficulty) = {
            let chain = self.chain.read();
            if let Some(genesis) = chain.blocks().first() {
                return Ok(genesis.clone());
            }
            (Block::genesis(), chain.sealer(), chain.difficulty())
        };
        let sealed = sealer.seal(candidate, difficulty)?;
        self.chain.write().commit(sealed).cloned()
    }

    /// Seal a new block outside the chain lock and commit it to the tail.
    pub fn append(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<Block, ChainError> {
        let _guard = self.append_lock.lock();
        let (candidate, sealer, difficulty) = {
            let chain = self.chain.read();
            (
                chain.next_block(sender, recipient, payload)?,
                chain.sealer(),
                chain.difficulty(),
            )
        };
        let sealed = sealer.seal(candidate, difficulty)?;
        self.chain.write().commit(sealed).cloned()
    }

    /// Copy of the current block sequence.
    pub fn snapshot(&self) -> Vec<Block> {
        self.chain.read().blocks().to_vec()
    }

    pub fn len(&self) -> usize {
        self.chain.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.read().is_empty()
    }

    /// Validate a snapshot taken under the read lock.
    pub fn validate(&self) -> ValidationReport {
        let (blocks, difficulty) = {
            let chain = self.chain.read();
            (chain.blocks().to_vec(), chain.difficulty())
        };
        validate_blocks(&blocks, difficulty)
    }

    /// Apply `f` to a sealed block under the write lock.
    pub fn tamper<F>(&self, index: u64, f: F) -> Result<(), ChainError>
    where
        F: FnOnce(&mut Block),
    {
        let mut chain = self.chain.write();
        f(chain.block_mut(index)?);
        Ok(())
    }

    /// Unwrap the inner chain if this is the last handle.
    pub fn into_inner(self) -> Result<Chain, Self> {
        let SharedChain { chain, append_lock } = self;
        Arc::try_unwrap(chain)
            .map(RwLock::into_inner)
            .map_err(|chain| SharedChain { chain, append_lock })
    }
}
