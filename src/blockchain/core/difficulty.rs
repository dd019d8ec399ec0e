use crate::crypto::{has_zero_prefix, DIGEST_HEX_LEN};
use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Number of leading `'0'` characters a sealed digest must carry.
///
/// Always within `1..=64`, so the prefix never exceeds the hex length of a
/// SHA-256 digest and the nonce search can terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u32);

impl Difficulty {
    /// Accepts `1..=64`. The upper end is valid for validation, but a digest of
    /// 64 zeros is practically unreachable: sealing at that level only ends
    /// through a sealer's cancel token or timeout.
    pub fn new(zeros: u32) -> Result<Self, ChainError> {
        if zeros == 0 || zeros as usize > DIGEST_HEX_LEN {
            return Err(ChainError::InvalidDifficulty(zeros));
        }
        Ok(Difficulty(zeros))
    }

    pub fn zeros(&self) -> u32 {
        self.0
    }

    /// The exact prefix string sealing and validation both test against.
    pub fn prefix(&self) -> String {
        "0".repeat(self.0 as usize)
    }

    pub fn is_met_by(&self, digest: &str) -> bool {
        has_zero_prefix(digest, self.0 as usize)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty(DEFAULT_DIFFICULTY)
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = ChainError;

    fn try_from(zeros: u32) -> Result<Self, Self::Error> {
        Difficulty::new(zeros)
    }
}

impl From<Difficulty> for u32 {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matches_zero_count() {
        let difficulty = Difficulty::new(3).unwrap();
        assert_eq!(difficulty.prefix(), "000");
        assert!(difficulty.is_met_by("000abc"));
        assert!(!difficulty.is_met_by("00abc0"));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(Difficulty::new(0), Err(ChainError::InvalidDifficulty(0)));
        assert_eq!(Difficulty::new(65), Err(ChainError::InvalidDifficulty(65)));
        assert!(Difficulty::new(64).is_ok());
    }

    #[test]
    fn test_default_is_four() {
        assert_eq!(Difficulty::default().zeros(), 4);
        assert_eq!(Difficulty::default().prefix(), "0000");
    }
}
