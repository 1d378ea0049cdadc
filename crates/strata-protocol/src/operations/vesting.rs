use super::{check_fee, OperationBody};
use crate::asset::Asset;
use crate::error::{invalid, ProtocolResult};
use serde::{Deserialize, Serialize};
use strata_primitives::{AccountId, Timestamp, VestingBalanceId};

/// Policy a new vesting balance is created with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VestingPolicyInitializer {
    /// Coin-days-destroyed: funds unlock as coin-seconds accrue
    Cdd {
        /// Nothing can be withdrawn before this time
        start_claim: Timestamp,
        /// Coin-seconds needed per unit withdrawn
        vesting_seconds: u32,
    },
    /// Linear release after a cliff
    Linear {
        /// Vesting starts here
        begin_timestamp: Timestamp,
        /// Nothing vests before `begin_timestamp + vesting_cliff_seconds`
        vesting_cliff_seconds: u32,
        /// Everything has vested after `begin_timestamp + vesting_duration_seconds`
        vesting_duration_seconds: u32,
    },
}

impl VestingPolicyInitializer {
    /// Parameter sanity
    pub fn validate(&self, operation: &'static str) -> ProtocolResult<()> {
        match self {
            VestingPolicyInitializer::Cdd {
                vesting_seconds, ..
            } => {
                if *vesting_seconds == 0 {
                    return Err(invalid(operation, "vesting seconds must be positive"));
                }
            }
            VestingPolicyInitializer::Linear {
                vesting_cliff_seconds,
                vesting_duration_seconds,
                ..
            } => {
                if *vesting_duration_seconds == 0 {
                    return Err(invalid(operation, "vesting duration must be positive"));
                }
                if vesting_cliff_seconds > vesting_duration_seconds {
                    return Err(invalid(operation, "cliff after end of vesting"));
                }
            }
        }
        Ok(())
    }
}

/// Lock funds from `creator` in a vesting balance owned by `owner`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingBalanceCreateOperation {
    /// Fee
    pub fee: Asset,
    /// Funds come from this account, which pays the fee
    pub creator: AccountId,
    /// Account allowed to withdraw
    pub owner: AccountId,
    /// Amount locked
    pub amount: Asset,
    /// Release policy
    pub policy: VestingPolicyInitializer,
}

impl OperationBody for VestingBalanceCreateOperation {
    fn name(&self) -> &'static str {
        "vesting_balance_create"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.creator
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)?;
        if self.amount.amount <= 0 {
            return Err(invalid(self.name(), "amount must be positive"));
        }
        self.policy.validate(self.name())
    }
}

/// Withdraw vested funds to the owner
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingBalanceWithdrawOperation {
    /// Fee
    pub fee: Asset,
    /// Balance to withdraw from
    pub vesting_balance: VestingBalanceId,
    /// Must be the balance's owner; pays the fee
    pub owner: AccountId,
    /// Amount withdrawn
    pub amount: Asset,
}

impl OperationBody for VestingBalanceWithdrawOperation {
    fn name(&self) -> &'static str {
        "vesting_balance_withdraw"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.owner
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)?;
        if self.amount.amount <= 0 {
            return Err(invalid(self.name(), "amount must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdd_requires_vesting_seconds() {
        let policy = VestingPolicyInitializer::Cdd {
            start_claim: 0,
            vesting_seconds: 0,
        };
        assert!(policy.validate("vesting_balance_create").is_err());
    }

    #[test]
    fn test_linear_cliff_within_duration() {
        let policy = VestingPolicyInitializer::Linear {
            begin_timestamp: 0,
            vesting_cliff_seconds: 10,
            vesting_duration_seconds: 5,
        };
        assert!(policy.validate("vesting_balance_create").is_err());

        let policy = VestingPolicyInitializer::Linear {
            begin_timestamp: 0,
            vesting_cliff_seconds: 5,
            vesting_duration_seconds: 10,
        };
        assert!(policy.validate("vesting_balance_create").is_ok());
    }
}
