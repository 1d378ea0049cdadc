//! Hash functions: SHA-256 for digests, Keccak-256 for identifiers and addresses

use sha2::Sha256;
use sha3::{Digest, Keccak256};
use strata_primitives::{H160, H256};

/// Compute Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    H256::from_bytes(result.into())
}

/// Compute SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> H256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    H256::from_bytes(result.into())
}

/// SHA-256 of the concatenation of two hashes, used for merkle nodes
pub fn sha256_pair(left: &H256, right: &H256) -> H256 {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    H256::from_bytes(hasher.finalize().into())
}

/// 160-bit hash: Keccak-256 truncated to its first 20 bytes
pub fn hash160(data: &[u8]) -> H160 {
    keccak256(data).truncate_160()
}
