//! Transaction and block application.
//!
//! Pending transactions are applied on top of the head block inside one
//! outer undo session; each transaction gets its own nested session so a
//! failing one leaves no trace. Applying a block first rolls the pending
//! state back, applies the block in a fresh outermost session and then
//! re-pushes whatever pending transactions still apply.

use crate::database::Database;
use crate::error::{ChainError, ChainResult, ValidationError};
use crate::evaluator::{apply_operation, TransactionEvalState};
use crate::objects::{
    DelegateObject, LimitOrderObject, ShortOrderObject, TransactionObject, WitnessObject,
    WorkerObject, WorkerPayPolicy,
};
use std::collections::BTreeSet;
use std::ops::BitOr;
use strata_crypto::{hash160, sha256, PrivateKey};
use strata_primitives::{
    AssetId, DelegateId, DynamicGlobalPropertyId, GlobalPropertyId, ShareType, Timestamp,
    WitnessId, H160, H256, SECONDS_PER_DAY,
};
use strata_protocol::operations::KeyData;
use strata_protocol::{codec, BlockHeader, ChainParameters, SignedBlock, SignedTransaction};
use tracing::{debug, info, warn};

/// Checks a caller may bypass, e.g. when replaying blocks it already validated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SkipFlags(u32);

impl SkipFlags {
    /// Run every check
    pub const NONE: SkipFlags = SkipFlags(0);
    /// Trust transaction signatures; skips authority checks
    pub const SIGNATURES: SkipFlags = SkipFlags(1 << 0);
    /// Allow a transaction id that was already applied
    pub const DUPLICATE_CHECK: SkipFlags = SkipFlags(1 << 1);
    /// Ignore transaction expiration
    pub const EXPIRATION: SkipFlags = SkipFlags(1 << 2);
    /// Trust the witness signature on a block
    pub const WITNESS_SIGNATURE: SkipFlags = SkipFlags(1 << 3);
    /// Trust the transaction merkle root
    pub const MERKLE_CHECK: SkipFlags = SkipFlags(1 << 4);
    /// Trust the witness secret reveal
    pub const SECRET_CHECK: SkipFlags = SkipFlags(1 << 5);
    /// Skip everything that can be skipped
    pub const ALL: SkipFlags = SkipFlags(0x3f);

    /// Whether every flag in `other` is set
    pub fn contains(self, other: SkipFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SkipFlags {
    type Output = SkipFlags;

    fn bitor(self, rhs: SkipFlags) -> SkipFlags {
        SkipFlags(self.0 | rhs.0)
    }
}

/// Secret a witness reveals in its next block: SHA-256 of its signing key
/// and the secret it revealed last
pub fn witness_secret(key: &PrivateKey, last_secret: &H256) -> H256 {
    let mut data = key.to_bytes().to_vec();
    data.extend_from_slice(last_secret.as_bytes());
    sha256(&data)
}

/// Commitment a witness registers before producing its first block
pub fn initial_secret_hash(key: &PrivateKey) -> H160 {
    hash160(witness_secret(key, &H256::ZERO).as_bytes())
}

fn invalid_block(reason: impl Into<String>) -> ChainError {
    ChainError::InvalidBlock(reason.into())
}

impl Database {
    // ==================== Sessions ====================

    fn with_undo_session<T, F>(&mut self, apply: F) -> ChainResult<T>
    where
        F: FnOnce(&mut Database) -> ChainResult<T>,
    {
        self.begin_undo_session();
        match apply(self) {
            Ok(value) => {
                self.commit_undo_session()?;
                Ok(value)
            }
            Err(e) => {
                self.rollback_undo_session()?;
                Err(e)
            }
        }
    }

    fn check_no_foreign_session(&self) -> ChainResult<()> {
        if self.undo_depth() != usize::from(self.pending_session) {
            return Err(ChainError::UndoSessionOpen);
        }
        Ok(())
    }

    /// Undo the pending state, handing back the pending transactions
    fn clear_pending(&mut self) -> ChainResult<Vec<SignedTransaction>> {
        self.check_no_foreign_session()?;
        if self.pending_session {
            self.undo.rollback(&mut self.store)?;
            self.pending_session = false;
        }
        Ok(std::mem::take(&mut self.pending_transactions))
    }

    fn restore_pending(&mut self, transactions: Vec<SignedTransaction>) {
        for trx in transactions {
            if let Err(e) = self.push_transaction(trx, SkipFlags::NONE) {
                debug!(error = %e, "dropped pending transaction");
            }
        }
    }

    // ==================== Transactions ====================

    /// Apply a transaction on top of the pending state and queue it for
    /// the next block
    pub fn push_transaction(
        &mut self,
        trx: SignedTransaction,
        skip: SkipFlags,
    ) -> ChainResult<TransactionEvalState> {
        self.check_no_foreign_session()?;
        let opened = !self.pending_session;
        if opened {
            self.begin_undo_session();
            self.pending_session = true;
        }
        match self.with_undo_session(|db| db.apply_transaction(&trx, skip, false)) {
            Ok(state) => {
                self.pending_transactions.push(trx);
                Ok(state)
            }
            Err(e) => {
                if opened {
                    self.undo.rollback(&mut self.store)?;
                    self.pending_session = false;
                }
                Err(e)
            }
        }
    }

    /// Apply a committee-approved transaction outside the pending queue.
    ///
    /// Authority checks are skipped. The changes join the head block's
    /// undo session, so popping that block reverts them too.
    pub fn apply_proposed_transaction(
        &mut self,
        trx: &SignedTransaction,
    ) -> ChainResult<TransactionEvalState> {
        let pending = self.clear_pending()?;
        let reopened = self.undo.reopen_last();
        if !reopened {
            self.begin_undo_session();
        }
        let result = self.with_undo_session(|db| db.apply_transaction(trx, SkipFlags::NONE, true));
        if reopened {
            self.undo.commit_block()?;
        } else {
            self.undo.forget()?;
        }
        self.restore_pending(pending);
        result
    }

    fn apply_transaction(
        &mut self,
        trx: &SignedTransaction,
        skip: SkipFlags,
        proposed: bool,
    ) -> ChainResult<TransactionEvalState> {
        let parameters = &self.get_global_properties()?.parameters;
        let max_size = parameters.maximum_transaction_size as usize;
        let max_lifetime = parameters.maximum_time_until_expiration;

        let size = trx.encoded_size()?;
        if size > max_size {
            return Err(ChainError::InvalidTransaction(format!(
                "size {} exceeds limit {}",
                size, max_size
            )));
        }
        trx.trx.validate()?;

        let now = self.head_block_time()?;
        let expiration = trx.trx.expiration;
        if !skip.contains(SkipFlags::EXPIRATION) {
            if expiration <= now {
                return Err(ValidationError::Expired { expiration, now }.into());
            }
            if expiration > now.saturating_add(max_lifetime) {
                return Err(ChainError::InvalidTransaction(format!(
                    "expiration {} is more than {}s after head block time {}",
                    expiration, max_lifetime, now
                )));
            }
        }

        let trx_id = trx.id()?;
        if !skip.contains(SkipFlags::DUPLICATE_CHECK)
            && self.find_by_key::<TransactionObject>(&trx_id).is_some()
        {
            return Err(ChainError::InvalidTransaction(format!(
                "duplicate transaction {}",
                trx_id
            )));
        }

        let mut state = if proposed {
            TransactionEvalState::proposed()
        } else if skip.contains(SkipFlags::SIGNATURES) {
            TransactionEvalState {
                skip_authority_check: true,
                ..Default::default()
            }
        } else {
            TransactionEvalState::signed_by(trx.signee_addresses()?)
        };
        for op in &trx.trx.operations {
            apply_operation(self, &mut state, op)?;
        }

        if self.find_by_key::<TransactionObject>(&trx_id).is_none() {
            self.create::<TransactionObject, _>(|id| TransactionObject {
                id,
                trx_id,
                expiration,
                trx: trx.clone(),
            })?;
        }
        debug!(trx = %trx_id, operations = trx.trx.operations.len(), "applied transaction");
        Ok(state)
    }

    // ==================== Blocks ====================

    /// Apply a block on top of the head. The pending transactions are set
    /// aside for the block and re-pushed afterwards; those the block made
    /// invalid are dropped.
    pub fn apply_block(&mut self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<()> {
        let mut pending = self.clear_pending()?;

        self.begin_undo_session();
        if let Err(e) = self.apply_block_contents(block, skip) {
            self.rollback_undo_session()?;
            warn!(block = block.block_num(), error = %e, "rejected block");
            self.restore_pending(pending);
            return Err(e);
        }
        self.undo.commit_block()?;

        self.applied_blocks.push_back(block.clone());
        while self.applied_blocks.len() > self.config.max_undo_history {
            self.applied_blocks.pop_front();
        }
        info!(
            block = block.block_num(),
            witness = %block.header.witness,
            transactions = block.transactions.len(),
            "applied block"
        );

        pending.retain(|trx| !block.transactions.contains(trx));
        self.restore_pending(pending);
        Ok(())
    }

    fn apply_block_contents(&mut self, block: &SignedBlock, skip: SkipFlags) -> ChainResult<()> {
        let header = &block.header;
        let parameters = self.get_global_properties()?.parameters.clone();
        let (head_id, head_time, next_maintenance) = {
            let dynamic = self.get_dynamic_global_properties()?;
            (dynamic.head_block_id, dynamic.time, dynamic.next_maintenance_time)
        };

        if header.previous != head_id {
            return Err(invalid_block(format!(
                "previous {} is not the head block {}",
                header.previous, head_id
            )));
        }
        if header.timestamp <= head_time {
            return Err(invalid_block(format!(
                "timestamp {} is not after head block time {}",
                header.timestamp, head_time
            )));
        }
        if header.timestamp % u32::from(parameters.block_interval.max(1)) != 0 {
            return Err(invalid_block(format!(
                "timestamp {} is not aligned to the {}s block interval",
                header.timestamp, parameters.block_interval
            )));
        }
        let size = codec::encoded_size(block)?;
        if size > parameters.maximum_block_size as usize {
            return Err(invalid_block(format!(
                "size {} exceeds limit {}",
                size, parameters.maximum_block_size
            )));
        }
        if !skip.contains(SkipFlags::MERKLE_CHECK)
            && block.calculate_merkle_root()? != header.transaction_merkle_root
        {
            return Err(invalid_block("transaction merkle root mismatch"));
        }

        let witness = self
            .find(header.witness)
            .cloned()
            .ok_or_else(|| invalid_block(format!("unknown witness {}", header.witness)))?;
        if !self
            .get_global_properties()?
            .active_witnesses
            .contains(&witness.id)
        {
            return Err(invalid_block(format!("witness {} is not active", witness.id)));
        }
        if !skip.contains(SkipFlags::WITNESS_SIGNATURE) {
            self.check_witness_signature(block, &witness)?;
        }
        if !skip.contains(SkipFlags::SECRET_CHECK)
            && !witness.next_secret.is_zero()
            && hash160(header.previous_secret.as_bytes()) != witness.next_secret
        {
            return Err(invalid_block(format!(
                "witness {} revealed a secret that does not match its commitment",
                witness.id
            )));
        }

        for trx in &block.transactions {
            self.apply_transaction(trx, skip, false)?;
        }

        let block_id = block.id()?;
        let block_num = block.block_num();
        self.modify(DynamicGlobalPropertyId::new(0), |d| {
            d.head_block_number = block_num;
            d.head_block_id = block_id;
            d.time = header.timestamp;
            d.current_witness = witness.id;
        })?;

        let treasury = self.get_dynamic_global_properties()?.treasury;
        let pay = parameters.witness_pay_per_block.min(treasury).max(0);
        self.adjust_treasury(-pay)?;
        self.modify(witness.id, |w| {
            w.last_secret = header.previous_secret;
            w.next_secret = header.next_secret_hash;
            w.accumulated_income += pay;
        })?;

        if header.timestamp >= next_maintenance {
            self.perform_maintenance(header.timestamp)?;
        }
        self.clear_expired(header.timestamp)
    }

    fn check_witness_signature(&self, block: &SignedBlock, witness: &WitnessObject) -> ChainResult<()> {
        let key = self.get(witness.signing_key)?;
        match &key.key_data {
            KeyData::PublicKey(expected) => block
                .validate_signee(expected)
                .map_err(|e| invalid_block(e.to_string())),
            KeyData::Address(expected) => {
                let signee = block.signee().map_err(|e| invalid_block(e.to_string()))?;
                if signee.to_address() != *expected {
                    return Err(invalid_block(format!(
                        "signed by {} instead of {}",
                        signee.to_address(),
                        expected
                    )));
                }
                Ok(())
            }
        }
    }

    /// Build a block from the pending transactions that still apply, sign
    /// it with `signing_key` and apply it
    pub fn generate_block(
        &mut self,
        when: Timestamp,
        witness: WitnessId,
        signing_key: &PrivateKey,
        skip: SkipFlags,
    ) -> ChainResult<SignedBlock> {
        let pending = self.clear_pending()?;
        let max_block_size = self.get_global_properties()?.parameters.maximum_block_size as usize;

        let last_secret = self.get(witness)?.last_secret;
        let previous_secret = witness_secret(signing_key, &last_secret);
        let next_secret_hash = hash160(witness_secret(signing_key, &previous_secret).as_bytes());
        let header = BlockHeader {
            previous: self.head_block_id()?,
            timestamp: when,
            witness,
            next_secret_hash,
            previous_secret,
            transaction_merkle_root: H256::ZERO,
        };
        // Header, signature and length prefix; each transaction adds its encoding
        let mut block = SignedBlock::new(header, Vec::new());
        block.sign(signing_key)?;
        let mut block_size = codec::encoded_size(&block)?;

        self.begin_undo_session();
        for trx in &pending {
            let size = trx.encoded_size()?;
            if block_size + size > max_block_size {
                debug!("block full, leaving remaining transactions pending");
                break;
            }
            match self.with_undo_session(|db| db.apply_transaction(trx, skip, false)) {
                Ok(_) => {
                    block_size += size;
                    block.transactions.push(trx.clone());
                }
                Err(e) => debug!(error = %e, "left transaction out of block"),
            }
        }
        self.rollback_undo_session()?;

        block.header.transaction_merkle_root = block.calculate_merkle_root()?;
        block.sign(signing_key)?;

        self.pending_transactions = pending;
        self.apply_block(&block, skip)?;
        Ok(block)
    }

    /// Undo the last applied block. Its transactions go back to the front
    /// of the pending queue.
    pub fn pop_block(&mut self) -> ChainResult<SignedBlock> {
        self.check_no_foreign_session()?;
        if self.applied_blocks.is_empty() {
            return Err(ChainError::NoBlockToPop);
        }
        let pending = self.clear_pending()?;
        self.undo.pop_history(&mut self.store)?;
        let block = self.applied_blocks.pop_back().ok_or(ChainError::NoBlockToPop)?;
        info!(block = block.block_num(), "popped block");

        let mut requeue = block.transactions.clone();
        requeue.extend(pending);
        self.restore_pending(requeue);
        Ok(block)
    }

    /// Number of applied blocks that can still be popped
    pub fn poppable_blocks(&self) -> usize {
        self.applied_blocks.len()
    }

    // ==================== Maintenance ====================

    fn perform_maintenance(&mut self, now: Timestamp) -> ChainResult<()> {
        let witnesses: BTreeSet<WitnessId> =
            self.index::<WitnessObject>().iter().map(|w| w.id).collect();
        let delegates: BTreeSet<DelegateId> =
            self.index::<DelegateObject>().iter().map(|d| d.id).collect();
        self.modify(GlobalPropertyId::new(0), |g| {
            if let Some(parameters) = g.pending_parameters.take() {
                g.parameters = parameters;
            }
            g.active_witnesses = witnesses;
            g.active_delegates = delegates;
        })?;

        let parameters = self.get_global_properties()?.parameters.clone();
        self.pay_workers(now, &parameters)?;

        let interval = parameters.maintenance_interval.max(1);
        let mut next = self.get_dynamic_global_properties()?.next_maintenance_time;
        if next <= now {
            let missed = (now - next) / interval + 1;
            next = next.saturating_add(missed.saturating_mul(interval));
        }
        self.modify(DynamicGlobalPropertyId::new(0), |d| {
            d.next_maintenance_time = next;
            d.last_budget_time = now;
        })?;
        info!(next_maintenance = next, "maintenance done");
        Ok(())
    }

    /// Pay active workers from the treasury, in id order, out of the
    /// budget accrued since the last maintenance
    fn pay_workers(&mut self, now: Timestamp, parameters: &ChainParameters) -> ChainResult<()> {
        let dynamic = self.get_dynamic_global_properties()?;
        let elapsed = now.saturating_sub(dynamic.last_budget_time);
        let accrued = parameters.worker_budget_per_day as i128 * elapsed as i128
            / SECONDS_PER_DAY as i128;
        let mut budget = (accrued.min(dynamic.treasury as i128)).max(0) as ShareType;

        let workers: Vec<WorkerObject> = self
            .index::<WorkerObject>()
            .iter()
            .filter(|w| w.is_active(now))
            .cloned()
            .collect();
        for worker in workers {
            let pay = worker.pay_for(elapsed).min(budget);
            if pay <= 0 {
                continue;
            }
            budget -= pay;
            self.adjust_treasury(-pay)?;
            match worker.pay_policy {
                WorkerPayPolicy::Refund { .. } => {
                    self.modify_asset_dynamic_data(AssetId::CORE, |d| d.current_supply -= pay)?;
                    self.modify(worker.id, |w| {
                        if let WorkerPayPolicy::Refund { total_burned } = &mut w.pay_policy {
                            *total_burned += pay;
                        }
                    })?;
                }
                WorkerPayPolicy::Vesting { balance } => {
                    self.modify(balance, |v| v.deposit(now, pay))?;
                }
            }
            debug!(worker = %worker.id, pay, "paid worker");
        }
        Ok(())
    }

    /// Remove expired orders, refunding their escrow, and forget expired
    /// transaction records
    fn clear_expired(&mut self, now: Timestamp) -> ChainResult<()> {
        let limit_orders: Vec<LimitOrderObject> = self
            .index::<LimitOrderObject>()
            .iter()
            .filter(|o| o.expiration <= now)
            .cloned()
            .collect();
        for order in limit_orders {
            self.remove(order.id)?;
            self.adjust_balance(order.seller, order.amount_for_sale())?;
            debug!(order = %order.id, "expired limit order");
        }

        let short_orders: Vec<ShortOrderObject> = self
            .index::<ShortOrderObject>()
            .iter()
            .filter(|o| o.expiration <= now)
            .cloned()
            .collect();
        for order in short_orders {
            self.remove(order.id)?;
            self.adjust_balance(order.seller, order.collateral)?;
            debug!(order = %order.id, "expired short order");
        }

        let records: Vec<_> = self
            .index::<TransactionObject>()
            .iter()
            .filter(|t| t.expiration <= now)
            .map(|t| t.id)
            .collect();
        for id in records {
            self.remove(id)?;
        }
        Ok(())
    }
}
