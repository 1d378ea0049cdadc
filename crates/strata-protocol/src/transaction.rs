//! Transactions: an ordered list of operations plus signatures

use crate::block::BlockId;
use crate::codec;
use crate::error::{ProtocolError, ProtocolResult};
use crate::operations::Operation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strata_crypto::{recover_public_key, sha256, sign, CompactSignature, PrivateKey};
use strata_primitives::{AccountId, Address, Timestamp, H160, H256};

/// Transaction id: the first 160 bits of the transaction digest
pub type TransactionId = H160;

/// Unsigned transaction
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    /// Low 16 bits of a recent block number
    pub ref_block_num: u16,
    /// Bytes 4..8 of that block's id
    pub ref_block_prefix: u32,
    /// Transaction is invalid after this time
    pub expiration: Timestamp,
    /// Operations, applied in order
    pub operations: Vec<Operation>,
}

impl Transaction {
    /// Transaction carrying the given operations
    pub fn new(expiration: Timestamp, operations: Vec<Operation>) -> Self {
        Self {
            expiration,
            operations,
            ..Default::default()
        }
    }

    /// Bind the transaction to a recent block
    pub fn set_reference_block(&mut self, block_id: &BlockId) {
        self.ref_block_num = (block_id.block_num() & 0xffff) as u16;
        self.ref_block_prefix = block_id.prefix();
    }

    /// SHA-256 of the canonical encoding; the value that is signed
    pub fn digest(&self) -> ProtocolResult<H256> {
        Ok(sha256(&codec::encode(self)?))
    }

    /// Transaction id
    pub fn id(&self) -> ProtocolResult<TransactionId> {
        Ok(self.digest()?.truncate_160())
    }

    /// Stateless checks over all operations
    pub fn validate(&self) -> ProtocolResult<()> {
        if self.operations.is_empty() {
            return Err(ProtocolError::EmptyTransaction);
        }
        for op in &self.operations {
            op.validate()?;
        }
        Ok(())
    }

    /// Accounts whose active authority must sign
    pub fn required_active_authorities(&self) -> BTreeSet<AccountId> {
        let mut out = BTreeSet::new();
        for op in &self.operations {
            op.required_active_authorities(&mut out);
        }
        out
    }
}

/// Transaction plus the signatures authorizing it
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Signed content
    pub trx: Transaction,
    /// Compact signatures over `trx.digest()`
    pub signatures: Vec<CompactSignature>,
}

impl SignedTransaction {
    /// Wrap an unsigned transaction
    pub fn new(trx: Transaction) -> Self {
        Self {
            trx,
            signatures: Vec::new(),
        }
    }

    /// Add a signature by `key`
    pub fn sign(&mut self, key: &PrivateKey) -> ProtocolResult<()> {
        let digest = self.trx.digest()?;
        self.signatures.push(sign(&digest, key)?);
        Ok(())
    }

    /// Digest of the unsigned content
    pub fn digest(&self) -> ProtocolResult<H256> {
        self.trx.digest()
    }

    /// Transaction id; signatures do not affect it
    pub fn id(&self) -> ProtocolResult<TransactionId> {
        self.trx.id()
    }

    /// Addresses of every signer
    pub fn signee_addresses(&self) -> ProtocolResult<BTreeSet<Address>> {
        let digest = self.trx.digest()?;
        self.signatures
            .iter()
            .map(|sig| -> ProtocolResult<Address> {
                Ok(recover_public_key(&digest, sig)?.to_address())
            })
            .collect()
    }

    /// Size of the canonical encoding
    pub fn encoded_size(&self) -> ProtocolResult<usize> {
        Ok(codec::encoded_size(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::operations::TransferOperation;
    use bytes::Bytes;
    use strata_crypto::{derive_private_key, PublicKey};

    fn trx() -> Transaction {
        Transaction::new(
            1_000,
            vec![TransferOperation {
                fee: Asset::core(20),
                from: AccountId::new(1),
                to: AccountId::new(2),
                amount: Asset::core(5),
                memo: Bytes::new(),
            }
            .into()],
        )
    }

    // ==================== Transaction tests ====================

    #[test]
    fn test_empty_transaction_invalid() {
        let trx = Transaction::new(1_000, vec![]);
        assert_eq!(trx.validate(), Err(ProtocolError::EmptyTransaction));
        assert!(self::trx().validate().is_ok());
    }

    #[test]
    fn test_digest_covers_every_field() {
        let base = trx().digest().unwrap();
        let mut changed = trx();
        changed.expiration += 1;
        assert_ne!(changed.digest().unwrap(), base);

        let mut changed = trx();
        changed.ref_block_prefix = 7;
        assert_ne!(changed.digest().unwrap(), base);
    }

    #[test]
    fn test_id_is_truncated_digest() {
        let trx = trx();
        assert_eq!(trx.id().unwrap(), trx.digest().unwrap().truncate_160());
    }

    #[test]
    fn test_reference_block() {
        let id = BlockId::from_bytes([
            0, 1, 0x02, 0x03, 0xaa, 0xbb, 0xcc, 0xdd, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ]);
        let mut trx = trx();
        trx.set_reference_block(&id);
        assert_eq!(trx.ref_block_num, 0x0203);
        assert_eq!(trx.ref_block_prefix, u32::from_le_bytes([0xaa, 0xbb, 0xcc, 0xdd]));
    }

    #[test]
    fn test_required_authorities() {
        let auths = trx().required_active_authorities();
        assert!(auths.contains(&AccountId::new(1)));
        assert_eq!(auths.len(), 1);
    }

    // ==================== SignedTransaction tests ====================

    #[test]
    fn test_sign_and_recover_signees() {
        let alice = derive_private_key(b"alice").unwrap();
        let bob = derive_private_key(b"bob").unwrap();
        let mut signed = SignedTransaction::new(trx());
        signed.sign(&alice).unwrap();
        signed.sign(&bob).unwrap();

        let signees = signed.signee_addresses().unwrap();
        assert!(signees.contains(&PublicKey::from_private_key(&alice).to_address()));
        assert!(signees.contains(&PublicKey::from_private_key(&bob).to_address()));
        assert_eq!(signees.len(), 2);
    }

    #[test]
    fn test_signatures_do_not_change_id() {
        let mut signed = SignedTransaction::new(trx());
        let before = signed.id().unwrap();
        signed.sign(&derive_private_key(b"alice").unwrap()).unwrap();
        assert_eq!(signed.id().unwrap(), before);
        assert!(signed.encoded_size().unwrap() > codec::encoded_size(&signed.trx).unwrap());
    }

    #[test]
    fn test_tampered_transaction_changes_signee() {
        let alice = derive_private_key(b"alice").unwrap();
        let mut signed = SignedTransaction::new(trx());
        signed.sign(&alice).unwrap();
        signed.trx.expiration += 1;

        let alice_addr = PublicKey::from_private_key(&alice).to_address();
        match signed.signee_addresses() {
            Ok(signees) => assert!(!signees.contains(&alice_addr)),
            Err(_) => {}
        }
    }
}
