use crate::crypto::NonceHasher;
use crate::error::ChainError;
use crate::miner::{Sealer, SequentialSealer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::difficulty::Difficulty;
use super::validation::{validate_blocks, ValidationReport};

pub const GENESIS_SENDER: &str = "admin";
pub const GENESIS_RECIPIENT: &str = "admin2";
pub const GENESIS_PAYLOAD: &str = "Genesis block";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    // Header
    pub index: u64,
    pub created_at: u64,
    pub previous_digest: String,
    pub digest: String,
    pub nonce: u64,

    // Body
    pub sender: String,
    pub recipient: String,
    pub payload: String,

    /// Wall-clock time spent sealing. Not part of the digest.
    pub seal_duration: Duration,
}

impl Block {
    /// Builds an unsealed block stamped with the current time.
    pub fn new(
        index: u64,
        previous_digest: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Block {
            index,
            created_at: chrono::Utc::now().timestamp_millis() as u64,
            previous_digest: previous_digest.into(),
            digest: String::new(),
            nonce: 0,
            sender: sender.into(),
            recipient: recipient.into(),
            payload: payload.into(),
            seal_duration: Duration::ZERO,
        }
    }

    /// The unsealed index-0 block with placeholder content.
    pub fn genesis() -> Self {
        Block::new(0, "", GENESIS_SENDER, GENESIS_RECIPIENT, GENESIS_PAYLOAD)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    /// Canonical preimage up to, but not including, the nonce.
    fn preimage_without_nonce(&self) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.sender, self.recipient, self.payload, self.created_at, self.previous_digest, self.index
        )
    }

    /// Hash state shared by every attempt of a nonce search over this block.
    pub fn hasher(&self) -> NonceHasher {
        NonceHasher::new(&self.preimage_without_nonce())
    }

    /// Digest of the block's current field values, ignoring the stored `digest`.
    pub fn compute_digest(&self) -> String {
        self.hasher().digest_with_nonce(self.nonce)
    }
}

/// Append-only sequence of sealed blocks.
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<Block>,
    difficulty: Difficulty,
    sealer: Arc<dyn Sealer>,
}

impl Chain {
    /// Create an empty chain sealed by the sequential nonce search.
    ///
    /// That search has no cancel flag or timeout, so it only returns once a
    /// matching digest is found. High difficulties (64 in particular) never
    /// finish; use [`Chain::with_sealer`] with a bounded sealer for those.
    pub fn new(difficulty: Difficulty) -> Self {
        Self::with_sealer(difficulty, Arc::new(SequentialSealer::new()))
    }

    pub fn with_sealer(difficulty: Difficulty, sealer: Arc<dyn Sealer>) -> Self {
        Chain {
            blocks: Vec::new(),
            difficulty,
            sealer,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn difficulty_prefix(&self) -> String {
        self.difficulty.prefix()
    }

    pub fn sealer(&self) -> Arc<dyn Sealer> {
        Arc::clone(&self.sealer)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn block(&self, index: u64) -> Result<&Block, ChainError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.blocks.get(i))
            .ok_or(ChainError::BlockNotFound(index))
    }

    /// Mutable access to a sealed block. Edits made here are not re-sealed;
    /// `validate` is expected to report them.
    pub fn block_mut(&mut self, index: u64) -> Result<&mut Block, ChainError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.blocks.get_mut(i))
            .ok_or(ChainError::BlockNotFound(index))
    }

    /// Seal and append the genesis block. Does nothing if the chain already
    /// has blocks.
    pub fn create_genesis(&mut self) -> Result<&Block, ChainError> {
        if self.blocks.is_empty() {
            let sealed = self.sealer.seal(Block::genesis(), self.difficulty)?;
            info!("Genesis block created #0: {}", sealed.digest);
            self.blocks.push(sealed);
        }
        Ok(&self.blocks[0])
    }

    /// Unsealed successor of the current tip.
    pub fn next_block(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<Block, ChainError> {
        let tip = self.tip().ok_or(ChainError::MissingGenesis)?;
        Ok(Block::new(
            tip.index + 1,
            tip.digest.clone(),
            sender,
            recipient,
            payload,
        ))
    }

    pub fn append(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<&Block, ChainError> {
        let candidate = self.next_block(sender, recipient, payload)?;
        let sealed = self.sealer.seal(candidate, self.difficulty)?;
        self.commit(sealed)
    }

    /// Push an already sealed block onto the tail.
    pub fn commit(&mut self, block: Block) -> Result<&Block, ChainError> {
        match self.blocks.last() {
            Some(tip) => {
                if block.index != tip.index + 1 {
                    return Err(ChainError::InvalidBlock(format!(
                        "Invalid block index. Expected {}, but got {}.",
                        tip.index + 1,
                        block.index
                    )));
                }
                if block.previous_digest != tip.digest {
                    return Err(ChainError::InvalidBlock(format!(
                        "Invalid previous digest. Expected {}, but got {}.",
                        tip.digest, block.previous_digest
                    )));
                }
            }
            None => {
                if !block.is_genesis() {
                    return Err(ChainError::MissingGenesis);
                }
                if !block.previous_digest.is_empty() {
                    return Err(ChainError::InvalidBlock(
                        "Genesis block must not reference a previous digest.".to_string(),
                    ));
                }
            }
        }

        if !self.difficulty.is_met_by(&block.digest) || block.compute_digest() != block.digest {
            return Err(ChainError::InvalidBlock(format!(
                "Block #{} is not sealed for difficulty {}.",
                block.index, self.difficulty
            )));
        }

        info!(
            "Sealed block #{}: {} ({:.2}s)",
            block.index,
            block.digest,
            block.seal_duration.as_secs_f64()
        );
        self.blocks.push(block);
        Ok(&self.blocks[self.blocks.len() - 1])
    }

    /// Check every block and collect all defects, keyed by block index.
    pub fn validate(&self) -> ValidationReport {
        validate_blocks(&self.blocks, self.difficulty)
    }

    /// The blocks failing any check, in ascending index order.
    pub fn invalid_blocks(&self) -> Vec<&Block> {
        self.validate()
            .invalid_indices()
            .filter_map(|index| self.block(index).ok())
            .collect()
    }
}
