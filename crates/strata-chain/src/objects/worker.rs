//! Treasury-funded workers

use crate::object::Object;
use serde::{Deserialize, Serialize};
use strata_primitives::{
    AccountId, ShareType, Timestamp, VestingBalanceId, VoteId, WorkerId, SECONDS_PER_DAY,
};

/// Where a worker's pay goes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerPayPolicy {
    /// Pay is burned
    Refund {
        /// Total burned so far
        total_burned: ShareType,
    },
    /// Pay is deposited into a CDD vesting balance owned by the worker's account
    Vesting {
        /// Backing balance
        balance: VestingBalanceId,
    },
}

/// A funded work proposal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerObject {
    /// Id
    pub id: WorkerId,
    /// Owner
    pub worker_account: AccountId,
    /// First second of work
    pub work_begin_date: Timestamp,
    /// Work stops before this second
    pub work_end_date: Timestamp,
    /// Core per day
    pub daily_pay: ShareType,
    /// Display name
    pub name: String,
    /// Proposal url
    pub url: String,
    /// Pay distribution
    pub pay_policy: WorkerPayPolicy,
    /// Worker vote slot
    pub vote_for: VoteId,
}

impl WorkerObject {
    /// Whether `now` lies in the work window
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.work_begin_date <= now && now < self.work_end_date
    }

    /// Pay owed for `elapsed` seconds of work, rounded down
    pub fn pay_for(&self, elapsed: u32) -> ShareType {
        (self.daily_pay as i128 * elapsed as i128 / SECONDS_PER_DAY as i128) as ShareType
    }
}

impl Object for WorkerObject {
    type Id = WorkerId;
    type Key = ();
    const TYPE_NAME: &'static str = "worker";

    fn id(&self) -> WorkerId {
        self.id
    }
}
