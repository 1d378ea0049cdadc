//! Database shared between a block producer and read-only consumers

use crate::database::Database;
use crate::error::ChainResult;
use crate::evaluator::TransactionEvalState;
use crate::executor::SkipFlags;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;
use strata_crypto::PrivateKey;
use strata_primitives::{BlockNum, Timestamp, WitnessId};
use strata_protocol::{SignedBlock, SignedTransaction};

/// Cloneable handle to one database.
///
/// Every mutating call holds the write lock for its whole apply cycle, so
/// at most one transaction push or block application runs at a time.
#[derive(Clone)]
pub struct ChainHandle {
    inner: Arc<RwLock<Database>>,
}

impl ChainHandle {
    /// Share `db`
    pub fn new(db: Database) -> Self {
        Self {
            inner: Arc::new(RwLock::new(db)),
        }
    }

    /// Read access
    pub fn read(&self) -> RwLockReadGuard<'_, Database> {
        self.inner.read()
    }

    /// Exclusive access
    pub fn write(&self) -> RwLockWriteGuard<'_, Database> {
        self.inner.write()
    }

    /// See [`Database::push_transaction`]
    pub fn push_transaction(
        &self,
        trx: SignedTransaction,
        skip: SkipFlags,
    ) -> ChainResult<TransactionEvalState> {
        self.inner.write().push_transaction(trx, skip)
    }

    /// See [`Database::apply_block`]
    pub fn apply_block(&self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<()> {
        self.inner.write().apply_block(block, skip)
    }

    /// See [`Database::generate_block`]
    pub fn generate_block(
        &self,
        when: Timestamp,
        witness: WitnessId,
        signing_key: &PrivateKey,
        skip: SkipFlags,
    ) -> ChainResult<SignedBlock> {
        self.inner
            .write()
            .generate_block(when, witness, signing_key, skip)
    }

    /// Height of the head block
    pub fn head_block_num(&self) -> ChainResult<BlockNum> {
        self.inner.read().head_block_num()
    }
}
