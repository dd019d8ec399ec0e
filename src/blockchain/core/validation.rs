use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use super::chain::Block;
use super::difficulty::Difficulty;

/// A single finding against one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Defect {
    /// `previous_digest` does not match the predecessor's stored digest.
    LinkMismatch { expected: String, found: String },
    /// The stored digest is not the digest of the block's current fields.
    DigestMismatch { stored: String, recomputed: String },
    /// The stored digest lacks the difficulty prefix.
    InsufficientWork { digest: String },
}

impl Defect {
    pub fn is_link_failure(&self) -> bool {
        matches!(self, Defect::LinkMismatch { .. })
    }

    pub fn is_integrity_failure(&self) -> bool {
        !self.is_link_failure()
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Defect::LinkMismatch { expected, found } => {
                write!(f, "previous digest {} does not match predecessor {}", found, expected)
            }
            Defect::DigestMismatch { stored, recomputed } => {
                write!(f, "stored digest {} does not match recomputed {}", stored, recomputed)
            }
            Defect::InsufficientWork { digest } => {
                write!(f, "digest {} does not meet the difficulty prefix", digest)
            }
        }
    }
}

/// Outcome of a validation walk. Empty means the chain is fully valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    defects: BTreeMap<u64, Vec<Defect>>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.defects.is_empty()
    }

    /// Number of distinct blocks with at least one defect.
    pub fn invalid_count(&self) -> usize {
        self.defects.len()
    }

    /// Indices of failing blocks, ascending, each reported once.
    pub fn invalid_indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.defects.keys().copied()
    }

    pub fn defects_for(&self, index: u64) -> &[Defect] {
        self.defects.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &[Defect])> + '_ {
        self.defects.iter().map(|(index, defects)| (*index, defects.as_slice()))
    }

    fn record(&mut self, index: u64, defect: Defect) {
        warn!("Block #{}: {}", index, defect);
        self.defects.entry(index).or_default().push(defect);
    }
}

/// Walk `blocks` in order and check linkage, digest and proof of work of each.
///
/// Never stops early: every block is visited so the report carries the full
/// defect set.
pub fn validate_blocks(blocks: &[Block], difficulty: Difficulty) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut previous: Option<&Block> = None;

    for block in blocks {
        debug!("Checking block #{} ...", block.index);

        if block.index > 0 {
            if let Some(prev) = previous {
                if block.previous_digest != prev.digest {
                    report.record(
                        block.index,
                        Defect::LinkMismatch {
                            expected: prev.digest.clone(),
                            found: block.previous_digest.clone(),
                        },
                    );
                }
            }
        }

        let recomputed = block.compute_digest();
        if recomputed != block.digest {
            report.record(
                block.index,
                Defect::DigestMismatch {
                    stored: block.digest.clone(),
                    recomputed,
                },
            );
        }

        if !difficulty.is_met_by(&block.digest) {
            report.record(
                block.index,
                Defect::InsufficientWork {
                    digest: block.digest.clone(),
                },
            );
        }

        previous = Some(block);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Chain;

    fn sealed_chain(blocks: usize) -> Chain {
        let mut chain = Chain::new(Difficulty::new(1).unwrap());
        chain.create_genesis().unwrap();
        for i in 1..blocks {
            chain.append("alice", "bob", format!("message {}", i)).unwrap();
        }
        chain
    }

    #[test]
    fn test_untouched_chain_is_valid() {
        let chain = sealed_chain(4);
        let report = chain.validate();
        assert!(report.is_valid());
        assert_eq!(report.invalid_count(), 0);
        // Validation is repeatable and does not mutate the chain
        assert_eq!(chain.validate(), report);
    }

    #[test]
    fn test_empty_chain_is_valid() {
        let chain = Chain::new(Difficulty::default());
        assert!(chain.validate().is_valid());
    }

    #[test]
    fn test_genesis_never_link_checked() {
        let mut chain = sealed_chain(2);
        chain.block_mut(0).unwrap().previous_digest = "deadbeef".to_string();

        let report = chain.validate();
        // Genesis fails its own digest recomputation but never the link check
        assert!(report.defects_for(0).iter().all(|d| !d.is_link_failure()));
        assert!(report.defects_for(0).iter().any(|d| d.is_integrity_failure()));
    }

    #[test]
    fn test_digest_tamper_implicates_successor_link() {
        let mut chain = sealed_chain(3);
        chain.block_mut(1).unwrap().digest = "0".repeat(64);

        let report = chain.validate();
        assert_eq!(report.invalid_indices().collect::<Vec<_>>(), vec![1, 2]);
        assert!(matches!(report.defects_for(1), [Defect::DigestMismatch { .. }]));
        assert!(matches!(report.defects_for(2), [Defect::LinkMismatch { .. }]));
    }

    #[test]
    fn test_all_defects_accumulate_for_one_block() {
        let mut chain = sealed_chain(3);
        {
            let block = chain.block_mut(2).unwrap();
            block.previous_digest = "1".repeat(64);
            block.digest = "f".repeat(64);
        }

        let report = chain.validate();
        let defects = report.defects_for(2);
        assert_eq!(defects.len(), 3);
        assert!(defects[0].is_link_failure());
        assert!(matches!(defects[1], Defect::DigestMismatch { .. }));
        assert!(matches!(defects[2], Defect::InsufficientWork { .. }));
        // Still a single entry for the block
        assert_eq!(report.invalid_count(), 1);
    }

    #[test]
    fn test_stricter_difficulty_flags_weak_work() {
        let chain = sealed_chain(3);
        let strict = Difficulty::new(64).unwrap();
        let report = validate_blocks(chain.blocks(), strict);
        assert_eq!(report.invalid_count(), 3);
        for (_, defects) in report.iter() {
            assert!(matches!(defects, [Defect::InsufficientWork { .. }]));
        }
    }
}
