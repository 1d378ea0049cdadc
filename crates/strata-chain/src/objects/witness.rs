//! Delegates, witnesses and vote tallies

use crate::object::Object;
use serde::{Deserialize, Serialize};
use strata_primitives::{
    AccountId, DelegateId, KeyId, ShareType, VoteId, VoteTallyId, WitnessId, H160, H256,
};

/// A committee delegate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateObject {
    /// Id
    pub id: DelegateId,
    /// Registered account
    pub delegate_account: AccountId,
    /// Committee vote slot
    pub vote_id: VoteId,
}

impl Object for DelegateObject {
    type Id = DelegateId;
    type Key = AccountId;
    const TYPE_NAME: &'static str = "delegate";

    fn id(&self) -> DelegateId {
        self.id
    }

    fn secondary_key(&self) -> Option<AccountId> {
        Some(self.delegate_account)
    }
}

/// A block-producing witness
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessObject {
    /// Id
    pub id: WitnessId,
    /// Registered account
    pub witness_account: AccountId,
    /// Key that signs the witness's blocks
    pub signing_key: KeyId,
    /// Hash of the secret the next block must reveal; zero accepts any
    pub next_secret: H160,
    /// Secret revealed by the witness's last block
    pub last_secret: H256,
    /// Block pay collected from the treasury
    pub accumulated_income: ShareType,
    /// Witness vote slot; its tally is indexed under the same id
    pub vote_id: VoteId,
}

impl Object for WitnessObject {
    type Id = WitnessId;
    type Key = AccountId;
    const TYPE_NAME: &'static str = "witness";

    fn id(&self) -> WitnessId {
        self.id
    }

    fn secondary_key(&self) -> Option<AccountId> {
        Some(self.witness_account)
    }
}

/// Votes accumulated by one candidate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTallyObject {
    /// Id
    pub id: VoteTallyId,
    /// Slot being counted
    pub vote_id: VoteId,
    /// Account standing for election
    pub candidate: AccountId,
    /// Weight voted for the candidate
    pub total_votes: ShareType,
}

impl Object for VoteTallyObject {
    type Id = VoteTallyId;
    type Key = VoteId;
    const TYPE_NAME: &'static str = "vote_tally";

    fn id(&self) -> VoteTallyId {
        self.id
    }

    fn secondary_key(&self) -> Option<VoteId> {
        Some(self.vote_id)
    }
}
