//! Test harness for end-to-end scenarios
//!
//! Owns one in-memory chain with a single block-producing witness and a set
//! of named, funded accounts whose keys are derived from their names.

use crate::builder::{account_key, signing_key, GenesisBuilder, TrxBuilder};
use crate::{E2EError, E2EResult};
use std::collections::BTreeMap;
use strata_chain::objects::AccountObject;
use strata_chain::{Database, DatabaseConfig, SkipFlags, TransactionEvalState};
use strata_crypto::PrivateKey;
use strata_primitives::{AccountId, AssetId, ShareType, Timestamp, WitnessId};
use strata_protocol::{SignedBlock, SignedTransaction};
use tracing::debug;

/// Head block time of a fresh harness
pub const GENESIS_TIME: Timestamp = 1_700_000_000;

/// Core balance of every default account
pub const FUNDED_BALANCE: ShareType = 10_000_000_000;

/// Core held by the treasury of a fresh harness
pub const INITIAL_TREASURY: ShareType = 100_000_000;

/// Name of the account owning the block-producing witness
pub const PRODUCER: &str = "init0";

/// Named account with its signing key
#[derive(Clone)]
pub struct TestAccount {
    name: String,
    id: AccountId,
    key: PrivateKey,
}

impl TestAccount {
    /// Account name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Account id
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Key controlling the account
    pub fn key(&self) -> &PrivateKey {
        &self.key
    }
}

impl std::fmt::Debug for TestAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestAccount")
            .field("name", &self.name)
            .field("id", &self.id.to_string())
            .finish()
    }
}

/// Chain plus everything needed to drive it
pub struct TestHarness {
    db: Database,
    accounts: BTreeMap<String, TestAccount>,
    witness: WitnessId,
    witness_key: PrivateKey,
}

impl TestHarness {
    /// Chain with a prime producer `init0` and prime, funded `alice`, `bob`
    /// and `carol`
    pub fn new() -> E2EResult<Self> {
        Self::with_genesis(Self::default_genesis())
    }

    /// Genesis used by [`TestHarness::new`], to be extended
    pub fn default_genesis() -> GenesisBuilder {
        GenesisBuilder::new(GENESIS_TIME)
            .prime_account(PRODUCER, 0)
            .prime_account("alice", FUNDED_BALANCE)
            .prime_account("bob", FUNDED_BALANCE)
            .prime_account("carol", FUNDED_BALANCE)
            .witness(PRODUCER)
            .delegate(PRODUCER)
            .treasury(INITIAL_TREASURY)
    }

    /// Chain from a custom genesis; its first witness produces every block
    pub fn with_genesis(genesis: GenesisBuilder) -> E2EResult<Self> {
        let producer = genesis
            .witnesses
            .first()
            .cloned()
            .ok_or_else(|| E2EError::Setup("genesis has no witness".to_string()))?;
        let db = Database::from_genesis(&genesis.to_config()?, DatabaseConfig::default())?;

        let mut accounts = BTreeMap::new();
        for (name, _, _) in &genesis.accounts {
            let id = db
                .find_by_key::<AccountObject>(name)
                .map(|a| a.id)
                .ok_or_else(|| E2EError::UnknownAccount(name.clone()))?;
            let account = TestAccount {
                name: name.clone(),
                id,
                key: account_key(name)?,
            };
            accounts.insert(name.clone(), account);
        }
        // Witnesses are created in genesis order
        let witness = WitnessId::new(0);
        let witness_key = signing_key(&producer)?;

        Ok(Self {
            db,
            accounts,
            witness,
            witness_key,
        })
    }

    /// Look up an account by name
    pub fn account(&self, name: &str) -> E2EResult<&TestAccount> {
        self.accounts
            .get(name)
            .ok_or_else(|| E2EError::UnknownAccount(name.to_string()))
    }

    /// Id of a named account
    pub fn id(&self, name: &str) -> E2EResult<AccountId> {
        Ok(self.account(name)?.id)
    }

    /// Track an account registered on chain after genesis
    pub fn track_account(&mut self, name: &str, key: PrivateKey) -> E2EResult<AccountId> {
        let id = self
            .db
            .find_by_key::<AccountObject>(&name.to_string())
            .map(|a| a.id)
            .ok_or_else(|| E2EError::UnknownAccount(name.to_string()))?;
        self.accounts.insert(
            name.to_string(),
            TestAccount {
                name: name.to_string(),
                id,
                key,
            },
        );
        Ok(id)
    }

    /// Balance of a named account
    pub fn balance(&self, name: &str, asset: AssetId) -> E2EResult<ShareType> {
        Ok(self.db.get_balance(self.id(name)?, asset))
    }

    /// Core balance of a named account
    pub fn core_balance(&self, name: &str) -> E2EResult<ShareType> {
        self.balance(name, AssetId::CORE)
    }

    /// Head block time
    pub fn now(&self) -> E2EResult<Timestamp> {
        Ok(self.db.head_block_time()?)
    }

    /// The chain
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// The chain, mutably
    pub fn db_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    /// Build a transaction signed by the named accounts
    pub fn sign(&self, trx: TrxBuilder, signers: &[&str]) -> E2EResult<SignedTransaction> {
        let keys = signers
            .iter()
            .map(|name| self.account(name).map(|a| &a.key))
            .collect::<E2EResult<Vec<_>>>()?;
        trx.build(&self.db, &keys)
    }

    /// Push a transaction into the pending state
    pub fn push(&mut self, trx: SignedTransaction) -> E2EResult<TransactionEvalState> {
        Ok(self.db.push_transaction(trx, SkipFlags::NONE)?)
    }

    /// Build, sign and push
    pub fn submit(&mut self, trx: TrxBuilder, signers: &[&str]) -> E2EResult<TransactionEvalState> {
        let trx = self.sign(trx, signers)?;
        self.push(trx)
    }

    /// Produce a block in the next slot
    pub fn produce_block(&mut self) -> E2EResult<SignedBlock> {
        let interval = self.block_interval()?;
        let when = self.now()? + interval;
        self.produce_block_at(when)
    }

    /// Produce a block at `when`, rounded up to a slot boundary
    pub fn produce_block_at(&mut self, when: Timestamp) -> E2EResult<SignedBlock> {
        let interval = self.block_interval()?;
        let when = when.div_ceil(interval) * interval;
        let block = self
            .db
            .generate_block(when, self.witness, &self.witness_key, SkipFlags::NONE)?;
        debug!(
            block = block.block_num(),
            transactions = block.transactions.len(),
            "produced block"
        );
        Ok(block)
    }

    /// Produce the block that runs the next maintenance
    pub fn produce_maintenance_block(&mut self) -> E2EResult<SignedBlock> {
        let next = self.db.get_dynamic_global_properties()?.next_maintenance_time;
        self.produce_block_at(next)
    }

    /// Apply a block produced elsewhere
    pub fn apply_block(&mut self, block: &SignedBlock) -> E2EResult<()> {
        Ok(self.db.apply_block(block, SkipFlags::NONE)?)
    }

    /// Fail unless the recorded supply of `asset` matches its holdings
    pub fn assert_supply_consistent(&self, asset: AssetId) -> E2EResult<()> {
        let audit = self.db.audit_supply(asset)?;
        if !audit.is_consistent() {
            return Err(E2EError::Assertion(format!(
                "supply of {} recorded as {} but {} is held",
                asset, audit.recorded, audit.computed
            )));
        }
        Ok(())
    }

    fn block_interval(&self) -> E2EResult<Timestamp> {
        let interval = self.db.get_global_properties()?.parameters.block_interval;
        Ok(Timestamp::from(interval.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_creation() {
        let harness = TestHarness::new().unwrap();
        assert_eq!(harness.now().unwrap(), GENESIS_TIME);
        assert_eq!(harness.db().head_block_num().unwrap(), 0);
        assert_eq!(harness.core_balance("alice").unwrap(), FUNDED_BALANCE);
        assert_eq!(harness.core_balance(PRODUCER).unwrap(), 0);
    }

    #[test]
    fn test_unknown_account() {
        let harness = TestHarness::new().unwrap();
        assert!(matches!(
            harness.account("mallory"),
            Err(E2EError::UnknownAccount(_))
        ));
    }

    #[test]
    fn test_genesis_needs_witness() {
        let genesis = GenesisBuilder::new(GENESIS_TIME).account("alice", 1);
        assert!(matches!(
            TestHarness::with_genesis(genesis),
            Err(E2EError::Setup(_))
        ));
    }

    #[test]
    fn test_produce_empty_blocks() {
        let mut harness = TestHarness::new().unwrap();
        harness.produce_block().unwrap();
        harness.produce_block().unwrap();
        assert_eq!(harness.db().head_block_num().unwrap(), 2);
        assert_eq!(harness.now().unwrap(), GENESIS_TIME + 10);
    }

    #[test]
    fn test_produce_block_rounds_to_slot() {
        let mut harness = TestHarness::new().unwrap();
        let block = harness.produce_block_at(GENESIS_TIME + 7).unwrap();
        assert_eq!(block.header.timestamp, GENESIS_TIME + 10);
    }

    #[test]
    fn test_fresh_chain_is_balanced() {
        let harness = TestHarness::new().unwrap();
        harness.assert_supply_consistent(AssetId::CORE).unwrap();
    }
}
