//! Deliberate corruption of sealed blocks, used to exercise validation.

use crate::blockchain::{Block, Chain};
use crate::crypto::random_digest;
use crate::error::ChainError;
use rand::Rng;
use std::fmt;
use tracing::info;

pub const MANIPULATED_PAYLOAD: &str = "This message was manipulated.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tamper {
    Digest(String),
    Payload(String),
    PreviousDigest(String),
}

impl Tamper {
    /// Pick one of the three edits at random. Replacement digests are hashes
    /// of a random number.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.gen_range(0..3) {
            0 => Tamper::Digest(random_digest(rng)),
            1 => Tamper::Payload(MANIPULATED_PAYLOAD.to_string()),
            _ => Tamper::PreviousDigest(random_digest(rng)),
        }
    }

    pub fn apply(&self, block: &mut Block) {
        match self {
            Tamper::Digest(digest) => block.digest = digest.clone(),
            Tamper::Payload(payload) => block.payload = payload.clone(),
            Tamper::PreviousDigest(digest) => block.previous_digest = digest.clone(),
        }
    }

    pub fn apply_to(&self, chain: &mut Chain, index: u64) -> Result<(), ChainError> {
        self.apply(chain.block_mut(index)?);
        info!("Block #{} manipulated: {}", index, self);
        Ok(())
    }
}

impl fmt::Display for Tamper {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Tamper::Digest(digest) => write!(f, "digest replaced with {}", digest),
            Tamper::Payload(payload) => write!(f, "payload replaced with {:?}", payload),
            Tamper::PreviousDigest(digest) => write!(f, "previous digest replaced with {}", digest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Difficulty;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn chain_of(len: usize) -> Chain {
        let mut chain = Chain::new(Difficulty::new(1).unwrap());
        chain.create_genesis().unwrap();
        for i in 1..len {
            chain.append("alice", "bob", format!("#{}", i)).unwrap();
        }
        chain
    }

    #[test]
    fn test_every_random_tamper_is_detected() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..12 {
            let mut chain = chain_of(3);
            let tamper = Tamper::random(&mut rng);
            tamper.apply_to(&mut chain, 1).unwrap();

            let report = chain.validate();
            assert!(report.invalid_indices().any(|i| i == 1), "{} went unnoticed", tamper);
            assert!(report.defects_for(0).is_empty());
        }
    }

    #[test]
    fn test_unknown_index_is_reported() {
        let mut chain = chain_of(2);
        let err = Tamper::Payload("x".into()).apply_to(&mut chain, 5).unwrap_err();
        assert_eq!(err, ChainError::BlockNotFound(5));
    }
}
