//! Key address type (20 bytes)
//!
//! An address is the short form under which a key is known on chain. It is
//! derived from a public key by `strata-crypto`, or stored directly when the
//! public key is not disclosed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Textual prefix of an address
pub const ADDRESS_PREFIX: &str = "STR";

/// Address parsing error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Missing `STR` prefix
    #[error("address must start with STR")]
    MissingPrefix,
    /// Invalid hex string
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    /// Invalid length
    #[error("invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// 20-byte key address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    /// Size of address in bytes
    pub const LEN: usize = 20;

    /// Zero address, never derived from a real key
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create address from bytes
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Create address from slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        let bytes: [u8; 20] = slice
            .try_into()
            .map_err(|_| AddressError::InvalidLength(slice.len()))?;
        Ok(Address(bytes))
    }

    /// Get as byte array
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Hex body without prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(ADDRESS_PREFIX)
            .ok_or(AddressError::MissingPrefix)?;
        let bytes = hex::decode(body).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ADDRESS_PREFIX, self.to_hex())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "STR742d35cc6634c0532925a3b844bc9e7595f0ab3d";

    // ==================== Parsing tests ====================

    #[test]
    fn test_address_parse_display_roundtrip() {
        let addr: Address = SAMPLE.parse().unwrap();
        assert_eq!(addr.to_string(), SAMPLE);
        assert!(!addr.is_zero());
    }

    #[test]
    fn test_address_parse_uppercase_hex() {
        let upper: Address = "STR742D35CC6634C0532925A3B844BC9E7595F0AB3D".parse().unwrap();
        let lower: Address = SAMPLE.parse().unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_address_missing_prefix() {
        let result = "742d35cc6634c0532925a3b844bc9e7595f0ab3d".parse::<Address>();
        assert_eq!(result, Err(AddressError::MissingPrefix));
    }

    #[test]
    fn test_address_invalid_hex() {
        let result = "STR742d35cc6634c0532925a3b844bc9e7595f0aGGG".parse::<Address>();
        assert!(matches!(result, Err(AddressError::InvalidHex(_))));
    }

    #[test]
    fn test_address_wrong_length() {
        let result = "STR742d35cc6634c0532925a3b844bc9e7595f0ab".parse::<Address>();
        assert_eq!(result, Err(AddressError::InvalidLength(19)));
        assert_eq!(Address::from_slice(&[0u8; 21]), Err(AddressError::InvalidLength(21)));
        assert_eq!(Address::from_slice(&[]), Err(AddressError::InvalidLength(0)));
    }

    // ==================== Value tests ====================

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert_eq!(Address::default(), Address::ZERO);
        assert_eq!(Address::LEN, 20);
    }

    #[test]
    fn test_address_ordering_is_bytewise() {
        let a = Address::from_bytes([0x01; 20]);
        let b = Address::from_bytes([0x02; 20]);
        assert!(a < b);
    }

    #[test]
    fn test_address_debug() {
        let addr: Address = SAMPLE.parse().unwrap();
        assert_eq!(format!("{:?}", addr), format!("Address({})", SAMPLE));
    }

    #[test]
    fn test_address_encodes_as_raw_bytes() {
        let addr = Address::from_bytes([0xab; 20]);
        let encoded = bincode::serialize(&addr).unwrap();
        assert_eq!(encoded, vec![0xab; 20]);
    }
}
