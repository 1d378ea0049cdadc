//! The chain database: every index, the undo log and the queries on them.
//!
//! [`Database`] is the only mutator of chain state. Each `create`, `modify`
//! and `remove` goes through the owning [`Index`], is recorded in the open
//! undo session, then published to the registered [`ChainObserver`]s.
//! Undo replays bypass both the indices' observers and the database's.

use crate::config::DatabaseConfig;
use crate::error::{ChainError, ChainResult, ValidationError};
use crate::index::{Index, IndexObserver};
use crate::objects::*;
use crate::store::{AnyObject, ObjectRef, ObjectStore, StoredObject};
use crate::undo::UndoLog;
use std::collections::VecDeque;
use std::sync::Arc;
use strata_primitives::{
    AccountId, AssetId, BlockNum, DynamicGlobalPropertyId, GlobalPropertyId, ShareType, Timestamp,
    TypedId, VoteCategory, VoteId,
};
use strata_protocol::{Asset, BlockId, FeeSchedule, ProtocolError, SignedBlock, SignedTransaction};

/// Receives every change made through the database
pub trait ChainObserver: Send + Sync {
    /// Object was created
    fn on_add(&self, _object: &AnyObject) {}

    /// Object was modified; receives the new state
    fn on_modify(&self, _object: &AnyObject) {}

    /// Object was removed; receives its last state
    fn on_remove(&self, _object: &AnyObject) {}
}

#[derive(Clone, Copy)]
enum Change {
    Added,
    Modified,
    Removed,
}

/// Recorded supply of an asset next to the sum of everything holding it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupplyAudit {
    /// Asset audited
    pub asset: AssetId,
    /// `current_supply` from the asset's dynamic data
    pub recorded: ShareType,
    /// Balances, vesting, escrow, fees and (for core) pools, treasury and
    /// witness income
    pub computed: i128,
}

impl SupplyAudit {
    /// Whether the recorded supply matches the holdings
    pub fn is_consistent(&self) -> bool {
        self.recorded as i128 == self.computed
    }
}

/// Object store with undo and observers
pub struct Database {
    pub(crate) store: ObjectStore,
    pub(crate) undo: UndoLog,
    observers: Vec<Arc<dyn ChainObserver>>,
    loaded: bool,
    pub(crate) config: DatabaseConfig,
    /// Applied blocks still undoable, oldest first
    pub(crate) applied_blocks: VecDeque<SignedBlock>,
    /// Transactions pushed since the head block, in arrival order
    pub(crate) pending_transactions: Vec<SignedTransaction>,
    /// Whether an undo session holds the pending transactions' changes
    pub(crate) pending_session: bool,
}

impl Database {
    /// Empty database; populate it with [`Database::from_genesis`]
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            store: ObjectStore::default(),
            undo: UndoLog::new(config.max_undo_history),
            observers: Vec::new(),
            loaded: false,
            config,
            applied_blocks: VecDeque::new(),
            pending_transactions: Vec::new(),
            pending_session: false,
        }
    }

    /// Options the database was opened with
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Whether the initial state has been loaded
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn set_loaded(&mut self) {
        self.loaded = true;
    }

    // ==================== Mutation ====================

    /// Create an object; `init` receives the id it will have
    pub fn create<T, F>(&mut self, init: F) -> ChainResult<T::Id>
    where
        T: StoredObject,
        F: FnOnce(T::Id) -> T,
    {
        let index = T::index_mut(&mut self.store);
        let prior_next = index.next_instance();
        let id = index.create(init)?;
        self.undo.on_create(id.object_id(), prior_next);
        if !self.observers.is_empty() {
            if let Some(object) = T::index(&self.store).find(id) {
                self.publish(Change::Added, &object.clone().into_any());
            }
        }
        Ok(id)
    }

    /// Mutate an object in place
    pub fn modify<I, F>(&mut self, id: I, mutate: F) -> ChainResult<()>
    where
        I: ObjectRef,
        F: FnOnce(&mut I::Object),
    {
        let before = <I::Object as StoredObject>::index_mut(&mut self.store).modify(id, mutate)?;
        self.undo.on_modify(before.into_any());
        if !self.observers.is_empty() {
            if let Some(object) = <I::Object as StoredObject>::index(&self.store).find(id) {
                self.publish(Change::Modified, &object.clone().into_any());
            }
        }
        Ok(())
    }

    /// Remove an object, returning it
    pub fn remove<I: ObjectRef>(&mut self, id: I) -> ChainResult<I::Object> {
        let removed = <I::Object as StoredObject>::index_mut(&mut self.store).remove(id)?;
        let snapshot = removed.clone().into_any();
        self.publish(Change::Removed, &snapshot);
        self.undo.on_remove(snapshot);
        Ok(removed)
    }

    fn publish(&self, change: Change, object: &AnyObject) {
        for observer in &self.observers {
            match change {
                Change::Added => observer.on_add(object),
                Change::Modified => observer.on_modify(object),
                Change::Removed => observer.on_remove(object),
            }
        }
    }

    // ==================== Lookup ====================

    /// Look up by id
    pub fn find<I: ObjectRef>(&self, id: I) -> Option<&I::Object> {
        <I::Object as StoredObject>::index(&self.store).find(id)
    }

    /// Look up by id, failing if absent
    pub fn get<I: ObjectRef>(&self, id: I) -> ChainResult<&I::Object> {
        <I::Object as StoredObject>::index(&self.store).get(id)
    }

    /// Look up by secondary key
    pub fn find_by_key<T: StoredObject>(&self, key: &T::Key) -> Option<&T> {
        T::index(&self.store).find_by_key(key)
    }

    /// The index of one object type
    pub fn index<T: StoredObject>(&self) -> &Index<T> {
        T::index(&self.store)
    }

    // ==================== Observers ====================

    /// Subscribe to every change; only after the initial load
    pub fn add_observer(&mut self, observer: Arc<dyn ChainObserver>) -> ChainResult<()> {
        if !self.loaded {
            return Err(ChainError::NotLoaded);
        }
        self.observers.push(observer);
        Ok(())
    }

    /// Subscribe to changes of one object type; only after the initial load
    pub fn add_index_observer<T: StoredObject>(
        &mut self,
        observer: Arc<dyn IndexObserver<T>>,
    ) -> ChainResult<()> {
        if !self.loaded {
            return Err(ChainError::NotLoaded);
        }
        T::index_mut(&mut self.store).add_observer(observer);
        Ok(())
    }

    // ==================== Undo ====================

    /// Open a session nested in the current one
    pub fn begin_undo_session(&mut self) {
        self.undo.begin();
    }

    /// Keep the top session's changes, merging them into its parent.
    ///
    /// Committing an outermost session makes its changes permanent. Applied
    /// blocks can no longer be popped past it.
    pub fn commit_undo_session(&mut self) -> ChainResult<()> {
        self.check_own_session()?;
        self.undo.commit()?;
        if !self.undo.is_active() {
            self.applied_blocks.clear();
        }
        Ok(())
    }

    /// Revert every change recorded by the top session
    pub fn rollback_undo_session(&mut self) -> ChainResult<()> {
        self.check_own_session()?;
        self.undo.rollback(&mut self.store)
    }

    // The pending transactions' session is closed only by the executor
    fn check_own_session(&self) -> ChainResult<()> {
        if self.undo.depth() <= usize::from(self.pending_session) {
            return Err(ChainError::NoUndoSession);
        }
        Ok(())
    }

    /// Number of open undo sessions
    pub fn undo_depth(&self) -> usize {
        self.undo.depth()
    }

    // ==================== Queries ====================

    /// Active parameters and vote counters
    pub fn get_global_properties(&self) -> ChainResult<&GlobalPropertyObject> {
        self.get(GlobalPropertyId::new(0))
    }

    /// Head block state
    pub fn get_dynamic_global_properties(&self) -> ChainResult<&DynamicGlobalPropertyObject> {
        self.get(DynamicGlobalPropertyId::new(0))
    }

    /// Fees currently charged
    pub fn current_fee_schedule(&self) -> ChainResult<&FeeSchedule> {
        Ok(&self.get_global_properties()?.parameters.current_fees)
    }

    /// Timestamp of the head block
    pub fn head_block_time(&self) -> ChainResult<Timestamp> {
        Ok(self.get_dynamic_global_properties()?.time)
    }

    /// Height of the head block
    pub fn head_block_num(&self) -> ChainResult<BlockNum> {
        Ok(self.get_dynamic_global_properties()?.head_block_number)
    }

    /// Id of the head block
    pub fn head_block_id(&self) -> ChainResult<BlockId> {
        Ok(self.get_dynamic_global_properties()?.head_block_id)
    }

    /// Transactions accepted since the head block
    pub fn pending_transactions(&self) -> &[SignedTransaction] {
        &self.pending_transactions
    }

    /// Balance of `account` in `asset`; zero without a balance record
    pub fn get_balance(&self, account: AccountId, asset: AssetId) -> ShareType {
        self.find_by_key::<AccountBalanceObject>(&(account, asset))
            .map_or(0, |balance| balance.balance)
    }

    /// Compare an asset's recorded supply with everything holding it
    pub fn audit_supply(&self, asset: AssetId) -> ChainResult<SupplyAudit> {
        let asset_object = self.get(asset)?;
        let dynamic = self.get(asset_object.dynamic_data)?;
        let mut computed: i128 = dynamic.accumulated_fees as i128;

        for balance in self.index::<AccountBalanceObject>().iter() {
            if balance.asset_type == asset {
                computed += balance.balance as i128;
            }
        }
        for vesting in self.index::<VestingBalanceObject>().iter() {
            if vesting.balance.asset_id == asset {
                computed += vesting.balance.amount as i128;
            }
        }
        for order in self.index::<LimitOrderObject>().iter() {
            let for_sale = order.amount_for_sale();
            if for_sale.asset_id == asset {
                computed += for_sale.amount as i128;
            }
        }
        for order in self.index::<ShortOrderObject>().iter() {
            if order.collateral.asset_id == asset {
                computed += order.collateral.amount as i128;
            }
        }
        for offer in self.index::<BondOfferObject>().iter() {
            if offer.escrow.asset_id == asset {
                computed += offer.escrow.amount as i128;
            }
        }
        if asset == AssetId::CORE {
            for data in self.index::<AssetDynamicDataObject>().iter() {
                computed += data.fee_pool as i128;
            }
            for witness in self.index::<WitnessObject>().iter() {
                computed += witness.accumulated_income as i128;
            }
            computed += self.get_dynamic_global_properties()?.treasury as i128;
        }

        Ok(SupplyAudit {
            asset,
            recorded: dynamic.current_supply,
            computed,
        })
    }

    // ==================== Bookkeeping helpers ====================

    /// Add `delta` to an account's balance, creating the record on first
    /// credit. A result below zero is rejected.
    pub(crate) fn adjust_balance(&mut self, account: AccountId, delta: Asset) -> ChainResult<()> {
        if delta.amount == 0 {
            return Ok(());
        }
        let existing = self
            .find_by_key::<AccountBalanceObject>(&(account, delta.asset_id))
            .map(|b| (b.id, b.balance));
        let (id, balance) = match existing {
            Some(found) => found,
            None => {
                if delta.amount < 0 {
                    return Err(insufficient(account, delta, 0));
                }
                self.create::<AccountBalanceObject, _>(|id| AccountBalanceObject {
                    id,
                    owner: account,
                    asset_type: delta.asset_id,
                    balance: delta.amount,
                })?;
                return Ok(());
            }
        };
        let updated = balance
            .checked_add(delta.amount)
            .ok_or(ProtocolError::Overflow)?;
        if updated < 0 {
            return Err(insufficient(account, delta, balance));
        }
        self.modify(id, |b| b.balance = updated)
    }

    /// Mutate the dynamic data of `asset`
    pub(crate) fn modify_asset_dynamic_data<F>(&mut self, asset: AssetId, mutate: F) -> ChainResult<()>
    where
        F: FnOnce(&mut AssetDynamicDataObject),
    {
        let id = self.get(asset)?.dynamic_data;
        self.modify(id, mutate)
    }

    /// Take the next vote id of `category` from the global counters
    pub(crate) fn allocate_vote_id(&mut self, category: VoteCategory) -> ChainResult<VoteId> {
        let mut allocated = None;
        self.modify(GlobalPropertyId::new(0), |g| {
            allocated = Some(g.allocate_vote_id(category))
        })?;
        allocated.ok_or(ChainError::ObjectNotFound(GlobalPropertyId::new(0).object_id()))
    }

    /// Allocate a vote id for `candidate` and open its tally
    pub(crate) fn register_candidate(
        &mut self,
        category: VoteCategory,
        candidate: AccountId,
    ) -> ChainResult<VoteId> {
        let vote_id = self.allocate_vote_id(category)?;
        self.create::<VoteTallyObject, _>(|id| VoteTallyObject {
            id,
            vote_id,
            candidate,
            total_votes: 0,
        })?;
        Ok(vote_id)
    }

    /// Add `delta` core to the treasury
    pub(crate) fn adjust_treasury(&mut self, delta: ShareType) -> ChainResult<()> {
        let treasury = self.get_dynamic_global_properties()?.treasury;
        let updated = treasury.checked_add(delta).ok_or(ProtocolError::Overflow)?;
        if updated < 0 {
            return Err(ValidationError::Precondition(format!(
                "treasury of {} cannot pay {}",
                treasury, -delta
            ))
            .into());
        }
        self.modify(DynamicGlobalPropertyId::new(0), |d| d.treasury = updated)
    }
}

fn insufficient(account: AccountId, delta: Asset, balance: ShareType) -> ChainError {
    ValidationError::InsufficientBalance {
        account,
        asset: delta.asset_id,
        balance,
        needed: -delta.amount,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use strata_primitives::{Address, KeyId, ObjectId};
    use strata_protocol::operations::KeyData;

    fn key(id: KeyId) -> KeyObject {
        KeyObject {
            id,
            key_data: KeyData::Address(Address::from_bytes([7; 20])),
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(&'static str, ObjectId)>>,
    }

    impl ChainObserver for Recorder {
        fn on_add(&self, object: &AnyObject) {
            self.events.lock().push(("add", object.object_id()));
        }

        fn on_modify(&self, object: &AnyObject) {
            self.events.lock().push(("modify", object.object_id()));
        }

        fn on_remove(&self, object: &AnyObject) {
            self.events.lock().push(("remove", object.object_id()));
        }
    }

    // ==================== Mutation tests ====================

    #[test]
    fn test_create_find_remove() {
        let mut db = Database::new(DatabaseConfig::default());
        let id = db.create::<KeyObject, _>(key).unwrap();
        assert_eq!(db.get(id).unwrap().id, id);

        let removed = db.remove(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(db.find(id).is_none());
        assert_eq!(db.get(id), Err(ChainError::ObjectNotFound(id.object_id())));
    }

    #[test]
    fn test_rollback_of_creation_reports_not_found() {
        let mut db = Database::new(DatabaseConfig::default());
        db.begin_undo_session();
        let id = db.create::<KeyObject, _>(key).unwrap();
        db.rollback_undo_session().unwrap();
        assert!(db.find(id).is_none());
        assert!(db.index::<KeyObject>().is_empty());
    }

    #[test]
    fn test_rollback_restores_modified_object() {
        let mut db = Database::new(DatabaseConfig::default());
        let id = db.create::<KeyObject, _>(key).unwrap();
        let before = db.get(id).unwrap().clone();

        db.begin_undo_session();
        db.modify(id, |k| k.key_data = KeyData::Address(Address::from_bytes([9; 20])))
            .unwrap();
        db.remove(id).unwrap();
        db.rollback_undo_session().unwrap();
        assert_eq!(db.get(id).unwrap(), &before);
    }

    // ==================== Observer tests ====================

    #[test]
    fn test_observers_require_load() {
        let mut db = Database::new(DatabaseConfig::default());
        let recorder = Arc::new(Recorder::default());
        assert_eq!(db.add_observer(recorder.clone()), Err(ChainError::NotLoaded));

        db.set_loaded();
        db.add_observer(recorder.clone()).unwrap();
        let id = db.create::<KeyObject, _>(key).unwrap();
        db.modify(id, |_| {}).unwrap();
        db.remove(id).unwrap();

        let oid = id.object_id();
        assert_eq!(
            *recorder.events.lock(),
            vec![("add", oid), ("modify", oid), ("remove", oid)]
        );
    }

    #[test]
    fn test_rollback_does_not_notify() {
        let mut db = Database::new(DatabaseConfig::default());
        db.set_loaded();
        let recorder = Arc::new(Recorder::default());
        db.add_observer(recorder.clone()).unwrap();

        db.begin_undo_session();
        db.create::<KeyObject, _>(key).unwrap();
        db.rollback_undo_session().unwrap();
        assert_eq!(recorder.events.lock().len(), 1);
    }

    // ==================== Balance tests ====================

    #[test]
    fn test_adjust_balance() {
        let mut db = Database::new(DatabaseConfig::default());
        let alice = AccountId::new(5);
        assert_eq!(db.get_balance(alice, AssetId::CORE), 0);

        assert!(matches!(
            db.adjust_balance(alice, Asset::core(-1)),
            Err(ChainError::Validation(ValidationError::InsufficientBalance { .. }))
        ));
        db.adjust_balance(alice, Asset::core(100)).unwrap();
        db.adjust_balance(alice, Asset::core(-40)).unwrap();
        assert_eq!(db.get_balance(alice, AssetId::CORE), 60);

        assert_eq!(
            db.adjust_balance(alice, Asset::core(-61)),
            Err(ChainError::Validation(ValidationError::InsufficientBalance {
                account: alice,
                asset: AssetId::CORE,
                balance: 60,
                needed: 61,
            }))
        );
        assert_eq!(db.index::<AccountBalanceObject>().len(), 1);
    }

    #[test]
    fn test_queries_fail_before_genesis() {
        let db = Database::new(DatabaseConfig::default());
        assert!(!db.is_loaded());
        assert!(db.head_block_num().is_err());
        assert!(db.current_fee_schedule().is_err());
    }
}
