//! Hashing primitives for linkchain

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a SHA-256 digest rendered as hex.
pub const DIGEST_HEX_LEN: usize = 64;

/// SHA-256 of `data`, rendered as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Returns true if `digest` starts with `zeros` `'0'` characters.
pub fn has_zero_prefix(digest: &str, zeros: usize) -> bool {
    digest.len() >= zeros && digest.bytes().take(zeros).all(|b| b == b'0')
}

/// Digest of a random number. Looks like a real digest but links to nothing.
pub fn random_digest<R: Rng + ?Sized>(rng: &mut R) -> String {
    let value: u32 = rng.gen_range(1..100_000);
    sha256_hex(value.to_string().as_bytes())
}

/// Hasher with everything except the trailing nonce already absorbed.
///
/// The nonce is the last component of a block's preimage, so the search loop
/// clones this state instead of rehashing the whole block on every attempt.
#[derive(Clone)]
pub struct NonceHasher {
    base: Sha256,
}

impl NonceHasher {
    pub fn new(preimage_without_nonce: &str) -> Self {
        let mut base = Sha256::new();
        base.update(preimage_without_nonce.as_bytes());
        Self { base }
    }

    pub fn digest_with_nonce(&self, nonce: u64) -> String {
        let mut hasher = self.base.clone();
        hasher.update(nonce.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vectors() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(sha256_hex(b"abc").len(), DIGEST_HEX_LEN);
    }

    #[test]
    fn test_nonce_hasher_matches_full_hash() {
        let hasher = NonceHasher::new("alicebobhello1700000000000abc3");
        assert_eq!(
            hasher.digest_with_nonce(42),
            sha256_hex(b"alicebobhello1700000000000abc342")
        );
        // Cloned state must not leak between attempts
        assert_eq!(hasher.digest_with_nonce(42), hasher.digest_with_nonce(42));
        assert_ne!(hasher.digest_with_nonce(42), hasher.digest_with_nonce(43));
    }

    #[test]
    fn test_zero_prefix() {
        assert!(has_zero_prefix("00ab", 2));
        assert!(!has_zero_prefix("0a0b", 2));
        assert!(has_zero_prefix("anything", 0));
        assert!(!has_zero_prefix("0", 2));
        assert!(!has_zero_prefix("", 1));
    }

    #[test]
    fn test_random_digest_shape() {
        let mut rng = rand::thread_rng();
        let digest = random_digest(&mut rng);
        assert_eq!(digest.len(), DIGEST_HEX_LEN);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
