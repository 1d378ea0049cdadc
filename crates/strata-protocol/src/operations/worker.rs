use super::{check_fee, OperationBody};
use crate::asset::Asset;
use crate::chain_parameters::{MAX_URL_LENGTH, MAX_WORKER_NAME_LENGTH};
use crate::error::{invalid, ProtocolResult};
use serde::{Deserialize, Serialize};
use strata_primitives::{AccountId, ShareType, Timestamp, MAX_SHARE_SUPPLY, SECONDS_PER_DAY};

/// Longest vesting period whose length in seconds fits a `u32`
pub const MAX_VESTING_PERIOD_DAYS: u16 = (u32::MAX / SECONDS_PER_DAY) as u16;

/// How a worker's pay is distributed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerInitializer {
    /// Pay is burned, returning it to the unissued supply
    Refund,
    /// Pay is deposited into a vesting balance owned by the worker's owner
    Vesting {
        /// Coin-days a unit of pay must age before withdrawal
        pay_vesting_period_days: u16,
    },
}

/// Register a treasury-funded worker
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCreateOperation {
    /// Fee
    pub fee: Asset,
    /// Owner, pays the fee
    pub owner: AccountId,
    /// First second of work
    pub work_begin_date: Timestamp,
    /// Work stops before this second
    pub work_end_date: Timestamp,
    /// Core paid per day of work
    pub daily_pay: ShareType,
    /// Display name
    pub name: String,
    /// Proposal url
    pub url: String,
    /// Pay policy
    pub initializer: WorkerInitializer,
}

impl OperationBody for WorkerCreateOperation {
    fn name(&self) -> &'static str {
        "worker_create"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.owner
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)?;
        if self.work_end_date <= self.work_begin_date {
            return Err(invalid(self.name(), "work must end after it begins"));
        }
        if self.daily_pay <= 0 || self.daily_pay > MAX_SHARE_SUPPLY {
            return Err(invalid(self.name(), "daily pay out of range"));
        }
        if self.name.len() > MAX_WORKER_NAME_LENGTH {
            return Err(invalid(self.name(), "name too long"));
        }
        if self.url.len() > MAX_URL_LENGTH {
            return Err(invalid(self.name(), "url too long"));
        }
        if let WorkerInitializer::Vesting {
            pay_vesting_period_days,
        } = self.initializer
        {
            if pay_vesting_period_days == 0 {
                return Err(invalid(self.name(), "vesting period must be positive"));
            }
            if pay_vesting_period_days > MAX_VESTING_PERIOD_DAYS {
                return Err(invalid(self.name(), "vesting period too long"));
            }
        }
        Ok(())
    }
}
