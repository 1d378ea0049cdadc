//! Singletons and applied-transaction records

use crate::object::Object;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strata_primitives::{
    BlockNum, DelegateId, DynamicGlobalPropertyId, GlobalPropertyId, ShareType, Timestamp,
    TransactionObjectId, VoteCategory, VoteId, WitnessId,
};
use strata_protocol::{BlockId, ChainParameters, SignedTransaction, TransactionId};

/// Consensus parameters and vote id counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalPropertyObject {
    /// Always 2.0.0
    pub id: GlobalPropertyId,
    /// Active parameters
    pub parameters: ChainParameters,
    /// Parameters activated at the next maintenance
    pub pending_parameters: Option<ChainParameters>,
    /// Next committee vote instance
    pub next_committee_vote_id: u32,
    /// Next witness vote instance
    pub next_witness_vote_id: u32,
    /// Next worker vote instance
    pub next_worker_vote_id: u32,
    /// Witnesses allowed to produce blocks
    pub active_witnesses: BTreeSet<WitnessId>,
    /// Current committee
    pub active_delegates: BTreeSet<DelegateId>,
}

impl GlobalPropertyObject {
    /// Take the next vote id of `category`
    pub fn allocate_vote_id(&mut self, category: VoteCategory) -> VoteId {
        let counter = match category {
            VoteCategory::Committee => &mut self.next_committee_vote_id,
            VoteCategory::Witness => &mut self.next_witness_vote_id,
            VoteCategory::Worker => &mut self.next_worker_vote_id,
        };
        let id = VoteId::new(category, *counter);
        *counter += 1;
        id
    }
}

impl Object for GlobalPropertyObject {
    type Id = GlobalPropertyId;
    type Key = ();
    const TYPE_NAME: &'static str = "global_property";

    fn id(&self) -> GlobalPropertyId {
        self.id
    }
}

/// Head block state, updated every block
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicGlobalPropertyObject {
    /// Always 2.1.0
    pub id: DynamicGlobalPropertyId,
    /// Height of the head block
    pub head_block_number: BlockNum,
    /// Id of the head block
    pub head_block_id: BlockId,
    /// Timestamp of the head block
    pub time: Timestamp,
    /// Producer of the head block
    pub current_witness: WitnessId,
    /// Next maintenance pass runs at the first block at or after this time
    pub next_maintenance_time: Timestamp,
    /// Time workers were last paid up to
    pub last_budget_time: Timestamp,
    /// Core held by the chain
    pub treasury: ShareType,
}

impl Object for DynamicGlobalPropertyObject {
    type Id = DynamicGlobalPropertyId;
    type Key = ();
    const TYPE_NAME: &'static str = "dynamic_global_property";

    fn id(&self) -> DynamicGlobalPropertyId {
        self.id
    }
}

/// Record of an applied transaction, kept until it expires so that
/// duplicates are rejected
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionObject {
    /// Id
    pub id: TransactionObjectId,
    /// Transaction id
    pub trx_id: TransactionId,
    /// Erased after this time
    pub expiration: Timestamp,
    /// The transaction
    pub trx: SignedTransaction,
}

impl Object for TransactionObject {
    type Id = TransactionObjectId;
    type Key = TransactionId;
    const TYPE_NAME: &'static str = "transaction";

    fn id(&self) -> TransactionObjectId {
        self.id
    }

    fn secondary_key(&self) -> Option<TransactionId> {
        Some(self.trx_id)
    }
}
