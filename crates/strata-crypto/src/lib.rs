//! # strata-crypto
//!
//! Cryptographic primitives for the Strata ledger.
//!
//! - SHA-256 digests and merkle node hashing
//! - Keccak-256 identifiers and address derivation
//! - Compact recoverable ECDSA signatures (secp256k1)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod signature;

pub use error::CryptoError;
pub use hash::{hash160, keccak256, sha256, sha256_pair};
pub use signature::{
    derive_private_key, public_key_to_address, recover_public_key, sign, verify,
    CompactSignature, PrivateKey, PublicKey,
};
