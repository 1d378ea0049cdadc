//! Canonical binary encoding.
//!
//! Every hashed, signed or transmitted value is encoded with bincode using
//! fixed-width little-endian integers and `u64` length prefixes, fields in
//! declaration order. Trailing bytes are rejected on decode so that one value
//! has exactly one encoding.

use crate::error::{CodecError, CodecResult};
use crate::operations::Operation;
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Encode a value
pub fn encode<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    options()
        .serialize(value)
        .map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode a value, rejecting trailing bytes
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    options()
        .deserialize(bytes)
        .map_err(|e| CodecError::Decode(e.to_string()))
}

/// Encoded size of a value in bytes
pub fn encoded_size<T: Serialize + ?Sized>(value: &T) -> CodecResult<usize> {
    options()
        .serialized_size(value)
        .map(|size| size as usize)
        .map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode an operation, reporting an out-of-range kind tag as such
pub fn decode_operation(bytes: &[u8]) -> CodecResult<Operation> {
    let tag_bytes: [u8; 4] = bytes
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| CodecError::Decode("missing operation tag".to_string()))?;
    let tag = u32::from_le_bytes(tag_bytes);
    if tag >= Operation::COUNT {
        return Err(CodecError::UnknownOperationTag(tag));
    }
    decode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::operations::TransferOperation;
    use bytes::Bytes;
    use strata_primitives::AccountId;

    fn transfer() -> Operation {
        TransferOperation {
            fee: Asset::core(1),
            from: AccountId::new(1),
            to: AccountId::new(2),
            amount: Asset::core(10),
            memo: Bytes::from_static(b"hi"),
        }
        .into()
    }

    #[test]
    fn test_fixed_width_little_endian() {
        let encoded = encode(&0x0102_0304u32).unwrap();
        assert_eq!(encoded, vec![4, 3, 2, 1]);
        assert_eq!(encode(&1u64).unwrap().len(), 8);
    }

    #[test]
    fn test_sequences_are_length_prefixed() {
        let encoded = encode(&vec![7u8, 8, 9]).unwrap();
        assert_eq!(&encoded[..8], &3u64.to_le_bytes());
        assert_eq!(&encoded[8..], &[7, 8, 9]);
    }

    #[test]
    fn test_operation_tag_leads_encoding() {
        let encoded = encode(&transfer()).unwrap();
        assert_eq!(&encoded[..4], &0u32.to_le_bytes());
        assert_eq!(decode_operation(&encoded).unwrap(), transfer());
        assert_eq!(encoded_size(&transfer()).unwrap(), encoded.len());
    }

    #[test]
    fn test_unknown_operation_tag() {
        let mut encoded = encode(&transfer()).unwrap();
        encoded[..4].copy_from_slice(&99u32.to_le_bytes());
        assert_eq!(
            decode_operation(&encoded),
            Err(CodecError::UnknownOperationTag(99))
        );
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut encoded = encode(&transfer()).unwrap();
        encoded.push(0);
        assert!(matches!(decode::<Operation>(&encoded), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_truncated_input() {
        assert!(decode_operation(&[0, 0]).is_err());
        let encoded = encode(&transfer()).unwrap();
        assert!(decode::<Operation>(&encoded[..encoded.len() - 1]).is_err());
    }
}
