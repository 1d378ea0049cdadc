//! Protocol-level errors

use strata_crypto::CryptoError;
use thiserror::Error;

/// Canonical encoding error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Value could not be encoded
    #[error("encode failed: {0}")]
    Encode(String),

    /// Bytes could not be decoded
    #[error("decode failed: {0}")]
    Decode(String),

    /// Envelope carries a different message type
    #[error("envelope tag mismatch: expected {expected}, got {got}")]
    TagMismatch {
        /// Tag of the requested message type
        expected: u32,
        /// Tag found in the envelope
        got: u32,
    },

    /// Operation tag outside the known set
    #[error("unknown operation tag: {0}")]
    UnknownOperationTag(u32),
}

/// Protocol error: malformed operations, transactions and blocks
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Encoding error
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Signature or key error
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Operation fails its stateless checks
    #[error("invalid {operation}: {reason}")]
    InvalidOperation {
        /// Operation name
        operation: &'static str,
        /// What was wrong
        reason: String,
    },

    /// Price with non-positive amounts or unusable asset pair
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// Asset does not belong to either side of a price
    #[error("asset {asset} cannot be converted by price {base}/{quote}")]
    PriceMismatch {
        /// Asset being converted
        asset: String,
        /// Base asset of the price
        base: String,
        /// Quote asset of the price
        quote: String,
    },

    /// Arithmetic overflow on share amounts
    #[error("amount overflow")]
    Overflow,

    /// Chain parameters out of range
    #[error("invalid chain parameters: {0}")]
    InvalidParameters(String),

    /// Transaction without operations
    #[error("transaction has no operations")]
    EmptyTransaction,

    /// Block carries no witness signature
    #[error("block is not signed")]
    Unsigned,

    /// Block was signed by a different key
    #[error("block signee mismatch: expected {expected}, got {got}")]
    SigneeMismatch {
        /// Expected signing key
        expected: String,
        /// Key recovered from the signature
        got: String,
    },
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

pub(crate) fn invalid(operation: &'static str, reason: impl Into<String>) -> ProtocolError {
    ProtocolError::InvalidOperation {
        operation,
        reason: reason.into(),
    }
}
