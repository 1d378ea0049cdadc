//! Blocks: header, witness signature and transactions.
//!
//! Two different hashes identify a block. The digest is the SHA-256 of the
//! unsigned content and is what the witness signs. The block id is derived
//! from the Keccak-256 of the fully signed block, truncated to 160 bits, with
//! the block number stored big-endian in its first four bytes so that ids
//! sort and index by height.

use crate::codec;
use crate::error::{ProtocolError, ProtocolResult};
use crate::transaction::SignedTransaction;
use serde::{Deserialize, Serialize};
use std::fmt;
use strata_crypto::{
    keccak256, recover_public_key, sha256, sha256_pair, sign, CompactSignature, PrivateKey,
    PublicKey,
};
use strata_primitives::{BlockNum, Timestamp, WitnessId, H160, H256};

/// 160-bit block identifier carrying the block number
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BlockId(H160);

impl BlockId {
    /// Id preceding the first block
    pub const ZERO: BlockId = BlockId(H160::ZERO);

    /// Create from bytes
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        BlockId(H160::from_bytes(bytes))
    }

    /// Id for a block hash at height `num`
    pub fn from_hash(hash: &H256, num: BlockNum) -> Self {
        let mut id = hash.truncate_160();
        id.as_bytes_mut()[..4].copy_from_slice(&num.to_be_bytes());
        BlockId(id)
    }

    /// Block number encoded in the id
    pub fn block_num(&self) -> BlockNum {
        let b = self.0.as_bytes();
        BlockNum::from_be_bytes([b[0], b[1], b[2], b[3]])
    }

    /// Bytes 4..8, referenced by transactions to bind them to this block
    pub fn prefix(&self) -> u32 {
        let b = self.0.as_bytes();
        u32::from_le_bytes([b[4], b[5], b[6], b[7]])
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Block header
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Id of the parent block
    pub previous: BlockId,
    /// Production time, a multiple of the block interval
    pub timestamp: Timestamp,
    /// Producing witness
    pub witness: WitnessId,
    /// Hash of the secret this witness will reveal in its next block
    pub next_secret_hash: H160,
    /// Secret committed to by the witness's previous block
    pub previous_secret: H256,
    /// Merkle root over the block's transactions
    pub transaction_merkle_root: H256,
}

impl BlockHeader {
    /// Height of this block
    pub fn block_num(&self) -> BlockNum {
        self.previous.block_num().wrapping_add(1)
    }
}

/// Block with its witness signature and transactions
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignedBlock {
    /// Header
    pub header: BlockHeader,
    /// Witness signature over [`SignedBlock::digest`]
    pub witness_signature: Option<CompactSignature>,
    /// Transactions, applied in order
    pub transactions: Vec<SignedTransaction>,
}

impl SignedBlock {
    /// Unsigned block
    pub fn new(header: BlockHeader, transactions: Vec<SignedTransaction>) -> Self {
        Self {
            header,
            witness_signature: None,
            transactions,
        }
    }

    /// Height of this block
    pub fn block_num(&self) -> BlockNum {
        self.header.block_num()
    }

    /// SHA-256 over header and transactions, excluding the signature
    pub fn digest(&self) -> ProtocolResult<H256> {
        let bytes = codec::encode(&(&self.header, &self.transactions))?;
        Ok(sha256(&bytes))
    }

    /// Id of the fully signed block
    pub fn id(&self) -> ProtocolResult<BlockId> {
        let hash = keccak256(&codec::encode(self)?);
        Ok(BlockId::from_hash(&hash, self.block_num()))
    }

    /// Merkle root over the transactions' encodings, `H256::ZERO` when empty.
    ///
    /// Leaves are the SHA-256 of each signed transaction. An odd node at the
    /// end of a level is carried up unchanged.
    pub fn calculate_merkle_root(&self) -> ProtocolResult<H256> {
        let mut level = self
            .transactions
            .iter()
            .map(|trx| -> ProtocolResult<H256> { Ok(sha256(&codec::encode(trx)?)) })
            .collect::<ProtocolResult<Vec<H256>>>()?;
        if level.is_empty() {
            return Ok(H256::ZERO);
        }
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => sha256_pair(left, right),
                    [single] => *single,
                    _ => H256::ZERO,
                })
                .collect();
        }
        Ok(level[0])
    }

    /// Sign the digest with the witness's signing key
    pub fn sign(&mut self, key: &PrivateKey) -> ProtocolResult<()> {
        let digest = self.digest()?;
        self.witness_signature = Some(sign(&digest, key)?);
        Ok(())
    }

    /// Public key that signed this block
    pub fn signee(&self) -> ProtocolResult<PublicKey> {
        let signature = self.witness_signature.as_ref().ok_or(ProtocolError::Unsigned)?;
        Ok(recover_public_key(&self.digest()?, signature)?)
    }

    /// Succeeds iff `expected` signed this exact block content
    pub fn validate_signee(&self, expected: &PublicKey) -> ProtocolResult<()> {
        let signee = self.signee()?;
        if signee != *expected {
            return Err(ProtocolError::SigneeMismatch {
                expected: expected.to_string(),
                got: signee.to_string(),
            });
        }
        Ok(())
    }
}
