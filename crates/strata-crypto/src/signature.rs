//! Compact recoverable ECDSA signatures over secp256k1
//!
//! Signatures are 65 bytes, `header || r || s`, where the header encodes the
//! recovery id so that the signer's public key can be recovered from the
//! signature and the signed digest alone. Only low-s signatures are produced
//! and accepted, which makes every signature canonical.

use crate::{keccak256, sha256, CryptoError};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use strata_primitives::{Address, H256};

/// Half of the secp256k1 curve order (n/2)
const SECP256K1_N_DIV_2: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D,
    0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Full secp256k1 curve order (n)
const SECP256K1_N: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B,
    0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// Header offset for compressed-key compact signatures
const COMPACT_HEADER_BASE: u8 = 31;

/// Private key (32 bytes)
pub type PrivateKey = SigningKey;

/// Compressed secp256k1 public key (33 bytes)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey([u8; 33]);

impl PublicKey {
    /// Size of a compressed key in bytes
    pub const LEN: usize = 33;

    /// Compress a verifying key
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let encoded = key.to_encoded_point(true);
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(encoded.as_bytes());
        PublicKey(bytes)
    }

    /// Public half of a private key
    pub fn from_private_key(key: &PrivateKey) -> Self {
        Self::from_verifying_key(key.verifying_key())
    }

    /// Parse a compressed SEC1 encoding, rejecting points not on the curve
    pub fn from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; 33] = slice
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey(format!("expected 33 bytes, got {}", slice.len())))?;
        VerifyingKey::from_sec1_bytes(&bytes)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(PublicKey(bytes))
    }

    /// Parse from hex (with or without 0x prefix)
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Decompress into a verifying key
    pub fn to_verifying_key(&self) -> Result<VerifyingKey, CryptoError> {
        VerifyingKey::from_sec1_bytes(&self.0).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Compressed bytes
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Address this key is known under
    pub fn to_address(&self) -> Address {
        public_key_to_address(self)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Compact recoverable signature
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompactSignature {
    /// r component (32 bytes)
    pub r: [u8; 32],
    /// s component (32 bytes), always low-s when produced by [`sign`]
    pub s: [u8; 32],
    /// recovery id (0..=3)
    pub recovery_id: u8,
}

impl CompactSignature {
    /// Size in bytes
    pub const LEN: usize = 65;

    /// Convert to 65-byte representation (header || r || s)
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0] = COMPACT_HEADER_BASE + self.recovery_id;
        bytes[1..33].copy_from_slice(&self.r);
        bytes[33..].copy_from_slice(&self.s);
        bytes
    }

    /// Parse from the 65-byte representation
    pub fn from_bytes(bytes: &[u8; 65]) -> Result<Self, CryptoError> {
        let recovery_id = bytes[0]
            .checked_sub(COMPACT_HEADER_BASE)
            .filter(|id| *id <= 3)
            .ok_or(CryptoError::InvalidRecoveryId(bytes[0]))?;
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[1..33]);
        s.copy_from_slice(&bytes[33..]);
        Ok(CompactSignature { r, s, recovery_id })
    }

    /// Check if signature has a low-s value
    pub fn is_canonical(&self) -> bool {
        compare_bytes(&self.s, &SECP256K1_N_DIV_2) != Ordering::Greater
    }

    fn to_k256(&self) -> Result<K256Signature, CryptoError> {
        let r: k256::FieldBytes = self.r.into();
        let s: k256::FieldBytes = self.s.into();
        K256Signature::from_scalars(r, s).map_err(|e| CryptoError::InvalidSignature(e.to_string()))
    }
}

impl fmt::Debug for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactSignature(0x{})", hex::encode(self.to_bytes()))
    }
}

/// Compare two 32-byte arrays as big-endian integers
fn compare_bytes(a: &[u8; 32], b: &[u8; 32]) -> Ordering {
    a.iter().cmp(b.iter())
}

/// Subtract s from n (secp256k1 order), used for s normalization: s' = n - s
fn subtract_from_n(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: u16 = 0;

    for i in (0..32).rev() {
        let diff = (SECP256K1_N[i] as u16)
            .wrapping_sub(s[i] as u16)
            .wrapping_sub(borrow);
        result[i] = diff as u8;
        borrow = if diff > 255 { 1 } else { 0 };
    }

    result
}

/// Sign a digest with a private key, producing a canonical compact signature
pub fn sign(digest: &H256, private_key: &PrivateKey) -> Result<CompactSignature, CryptoError> {
    let (signature, mut recovery_id) = private_key
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    let r: [u8; 32] = signature.r().to_bytes().into();
    let mut s: [u8; 32] = signature.s().to_bytes().into();

    // If s > n/2, replace s with n - s and flip the parity bit of the recovery id
    if compare_bytes(&s, &SECP256K1_N_DIV_2) == Ordering::Greater {
        s = subtract_from_n(&s);
        recovery_id = RecoveryId::try_from(recovery_id.to_byte() ^ 1).map_err(|_| {
            CryptoError::SigningFailed("invalid recovery id after normalization".to_string())
        })?;
    }

    Ok(CompactSignature {
        r,
        s,
        recovery_id: recovery_id.to_byte(),
    })
}

/// Verify a signature against a digest and public key
pub fn verify(
    digest: &H256,
    signature: &CompactSignature,
    public_key: &PublicKey,
) -> Result<bool, CryptoError> {
    if !signature.is_canonical() {
        return Ok(false);
    }

    use k256::ecdsa::signature::hazmat::PrehashVerifier;
    let key = public_key.to_verifying_key()?;
    Ok(key
        .verify_prehash(digest.as_bytes(), &signature.to_k256()?)
        .is_ok())
}

/// Recover the signer's public key from a signature and the signed digest
pub fn recover_public_key(
    digest: &H256,
    signature: &CompactSignature,
) -> Result<PublicKey, CryptoError> {
    if !signature.is_canonical() {
        return Err(CryptoError::NonCanonicalSignature);
    }
    let recovery_id = RecoveryId::from_byte(signature.recovery_id)
        .ok_or(CryptoError::InvalidRecoveryId(signature.recovery_id))?;

    let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature.to_k256()?, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;
    Ok(PublicKey::from_verifying_key(&key))
}

/// Derive the address of a public key
///
/// The address is the last 20 bytes of the Keccak-256 hash of the
/// uncompressed point without its SEC1 tag byte.
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let Ok(key) = public_key.to_verifying_key() else {
        // `PublicKey` can only be built from a valid point
        return Address::ZERO;
    };
    let encoded = key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);

    let mut addr_bytes = [0u8; 20];
    addr_bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::from_bytes(addr_bytes)
}

/// Deterministically derive a private key from seed bytes (SHA-256 of the seed)
pub fn derive_private_key(seed: &[u8]) -> Result<PrivateKey, CryptoError> {
    SigningKey::from_slice(sha256(seed).as_bytes()).map_err(|_| CryptoError::InvalidPrivateKey)
}

// ==================== Fixed-length serde ====================

fn serialize_fixed<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    let mut tuple = serializer.serialize_tuple(bytes.len())?;
    for byte in bytes {
        tuple.serialize_element(byte)?;
    }
    tuple.end()
}

struct FixedBytesVisitor<const N: usize>;

impl<'de, const N: usize> Visitor<'de> for FixedBytesVisitor<N> {
    type Value = [u8; N];

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", N)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut out = [0u8; N];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(i, &self))?;
        }
        Ok(out)
    }
}

fn deserialize_fixed<'de, D: Deserializer<'de>, const N: usize>(
    deserializer: D,
) -> Result<[u8; N], D::Error> {
    deserializer.deserialize_tuple(N, FixedBytesVisitor::<N>)
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_fixed(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = deserialize_fixed::<D, 33>(deserializer)?;
        PublicKey::from_slice(&bytes).map_err(de::Error::custom)
    }
}

impl Serialize for CompactSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_fixed(&self.to_bytes(), serializer)
    }
}

impl<'de> Deserialize<'de> for CompactSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = deserialize_fixed::<D, 65>(deserializer)?;
        CompactSignature::from_bytes(&bytes).map_err(de::Error::custom)
    }
}
