//! Wire envelope and gossip messages

use crate::block::{BlockId, SignedBlock};
use crate::codec;
use crate::error::{CodecError, CodecResult, ProtocolResult};
use crate::transaction::SignedTransaction;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Tag of [`TransactionMessage`]
pub const TRANSACTION_MESSAGE_TAG: u32 = 1000;
/// Tag of [`BlockMessage`]
pub const BLOCK_MESSAGE_TAG: u32 = 1001;

/// A message type with a transport tag
pub trait Tagged: Serialize + DeserializeOwned {
    /// Tag written into the envelope
    const TYPE_TAG: u32;
}

/// Typed container: a tag plus the encoded message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type
    pub type_tag: u32,
    /// Encoded message
    pub payload: Bytes,
}

impl Envelope {
    /// Encode a message into an envelope
    pub fn pack<T: Tagged>(message: &T) -> CodecResult<Self> {
        Ok(Self {
            type_tag: T::TYPE_TAG,
            payload: Bytes::from(codec::encode(message)?),
        })
    }

    /// Decode the payload as `T`, failing if the tag is not `T`'s
    pub fn unpack<T: Tagged>(&self) -> CodecResult<T> {
        if self.type_tag != T::TYPE_TAG {
            return Err(CodecError::TagMismatch {
                expected: T::TYPE_TAG,
                got: self.type_tag,
            });
        }
        codec::decode(&self.payload)
    }

    /// Whether the envelope holds a `T`
    pub fn is<T: Tagged>(&self) -> bool {
        self.type_tag == T::TYPE_TAG
    }

    /// Encoded envelope, as sent on the wire
    pub fn to_bytes(&self) -> CodecResult<Vec<u8>> {
        codec::encode(self)
    }

    /// Parse an envelope received from the wire
    pub fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        codec::decode(bytes)
    }
}

/// Gossip of one signed transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMessage {
    /// The transaction
    pub trx: SignedTransaction,
}

impl Tagged for TransactionMessage {
    const TYPE_TAG: u32 = TRANSACTION_MESSAGE_TAG;
}

/// Gossip of one signed block with its precomputed id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMessage {
    /// Id of `block`
    pub block_id: BlockId,
    /// The block
    pub block: SignedBlock,
}

impl BlockMessage {
    /// Wrap a block, computing its id
    pub fn new(block: SignedBlock) -> ProtocolResult<Self> {
        Ok(Self {
            block_id: block.id()?,
            block,
        })
    }

    /// Whether the carried id matches the block
    pub fn id_matches(&self) -> ProtocolResult<bool> {
        Ok(self.block.id()? == self.block_id)
    }
}

impl Tagged for BlockMessage {
    const TYPE_TAG: u32 = BLOCK_MESSAGE_TAG;
}
