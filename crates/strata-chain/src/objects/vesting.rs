//! Vesting balances and their release policies.
//!
//! Every balance change goes through the policy first: a deposit or
//! withdrawal accrues whatever the policy earned at the old balance, then
//! the balance moves.

use crate::error::ValidationError;
use crate::object::Object;
use serde::{Deserialize, Serialize};
use strata_primitives::{AccountId, AssetId, ShareType, Timestamp, VestingBalanceId};
use strata_protocol::operations::VestingPolicyInitializer;
use strata_protocol::Asset;

/// Coin-days-destroyed: holding `n` units for `vesting_seconds` unlocks `n`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CddPolicy {
    /// Coin-seconds consumed per unit withdrawn
    pub vesting_seconds: u32,
    /// Nothing can be withdrawn before this time
    pub start_claim: Timestamp,
    /// Coin-seconds accrued as of `coin_seconds_earned_last_update`
    pub coin_seconds_earned: u128,
    /// Last accrual time
    pub coin_seconds_earned_last_update: Timestamp,
}

impl CddPolicy {
    /// Policy with nothing earned yet
    pub fn new(vesting_seconds: u32, start_claim: Timestamp, now: Timestamp) -> Self {
        Self {
            vesting_seconds,
            start_claim,
            coin_seconds_earned: 0,
            coin_seconds_earned_last_update: now,
        }
    }

    /// Coin-seconds earned by `now` had the balance stayed at `balance`,
    /// capped at `balance * vesting_seconds`
    pub fn earned_at(&self, now: Timestamp, balance: ShareType) -> u128 {
        let balance = balance.max(0) as u128;
        let elapsed = now.saturating_sub(self.coin_seconds_earned_last_update) as u128;
        let earned = self
            .coin_seconds_earned
            .saturating_add(balance.saturating_mul(elapsed));
        earned.min(balance.saturating_mul(self.vesting_seconds as u128))
    }

    fn accrue(&mut self, now: Timestamp, balance: ShareType) {
        self.coin_seconds_earned = self.earned_at(now, balance);
        self.coin_seconds_earned_last_update = self.coin_seconds_earned_last_update.max(now);
    }

    fn allowed_withdraw(&self, now: Timestamp, balance: ShareType) -> ShareType {
        if now < self.start_claim || balance <= 0 {
            return 0;
        }
        let units = self.earned_at(now, balance) / self.vesting_seconds.max(1) as u128;
        units.min(balance as u128) as ShareType
    }

    fn on_withdraw(&mut self, now: Timestamp, balance: ShareType, amount: ShareType) {
        self.accrue(now, balance);
        let consumed = (amount.max(0) as u128).saturating_mul(self.vesting_seconds as u128);
        self.coin_seconds_earned = self.coin_seconds_earned.saturating_sub(consumed);
    }
}

/// Straight-line release of everything deposited, after a cliff
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearPolicy {
    /// Vesting starts here
    pub begin_timestamp: Timestamp,
    /// Nothing vests during the first `vesting_cliff_seconds`
    pub vesting_cliff_seconds: u32,
    /// Everything has vested after this many seconds
    pub vesting_duration_seconds: u32,
    /// Total ever deposited
    pub begin_balance: ShareType,
}

impl LinearPolicy {
    /// Amount vested at `now`, ignoring withdrawals
    pub fn vested(&self, now: Timestamp) -> ShareType {
        let now = now as u64;
        let begin = self.begin_timestamp as u64;
        if now < begin + self.vesting_cliff_seconds as u64 {
            return 0;
        }
        let elapsed = now - begin;
        if elapsed >= self.vesting_duration_seconds as u64 {
            return self.begin_balance;
        }
        (self.begin_balance as i128 * elapsed as i128 / self.vesting_duration_seconds as i128)
            as ShareType
    }

    fn allowed_withdraw(&self, now: Timestamp, balance: ShareType) -> ShareType {
        let withdrawn = self.begin_balance - balance;
        (self.vested(now) - withdrawn).clamp(0, balance.max(0))
    }
}

/// Release policy of a vesting balance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VestingPolicy {
    /// Coin-days-destroyed
    Cdd(CddPolicy),
    /// Linear after a cliff
    Linear(LinearPolicy),
}

impl VestingPolicy {
    /// Policy for a new, empty balance
    pub fn from_initializer(init: &VestingPolicyInitializer, now: Timestamp) -> Self {
        match *init {
            VestingPolicyInitializer::Cdd {
                start_claim,
                vesting_seconds,
            } => VestingPolicy::Cdd(CddPolicy::new(vesting_seconds, start_claim, now)),
            VestingPolicyInitializer::Linear {
                begin_timestamp,
                vesting_cliff_seconds,
                vesting_duration_seconds,
            } => VestingPolicy::Linear(LinearPolicy {
                begin_timestamp,
                vesting_cliff_seconds,
                vesting_duration_seconds,
                begin_balance: 0,
            }),
        }
    }

    /// Most that may be withdrawn at `now` from `balance`
    pub fn allowed_withdraw(&self, now: Timestamp, balance: ShareType) -> ShareType {
        match self {
            VestingPolicy::Cdd(policy) => policy.allowed_withdraw(now, balance),
            VestingPolicy::Linear(policy) => policy.allowed_withdraw(now, balance),
        }
    }

    fn on_deposit(&mut self, now: Timestamp, balance: ShareType, amount: ShareType) {
        match self {
            VestingPolicy::Cdd(policy) => policy.accrue(now, balance),
            VestingPolicy::Linear(policy) => policy.begin_balance += amount,
        }
    }

    fn on_withdraw(&mut self, now: Timestamp, balance: ShareType, amount: ShareType) {
        match self {
            VestingPolicy::Cdd(policy) => policy.on_withdraw(now, balance, amount),
            VestingPolicy::Linear(_) => {}
        }
    }
}

/// Funds locked under a release policy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingBalanceObject {
    /// Id
    pub id: VestingBalanceId,
    /// Account allowed to withdraw
    pub owner: AccountId,
    /// Amount locked
    pub balance: Asset,
    /// Release policy
    pub policy: VestingPolicy,
}

impl VestingBalanceObject {
    /// Empty balance
    pub fn new(id: VestingBalanceId, owner: AccountId, asset_id: AssetId, policy: VestingPolicy) -> Self {
        Self {
            id,
            owner,
            balance: Asset::new(0, asset_id),
            policy,
        }
    }

    /// Most that may be withdrawn at `now`
    pub fn allowed_withdraw(&self, now: Timestamp) -> ShareType {
        self.policy.allowed_withdraw(now, self.balance.amount)
    }

    /// Add funds
    pub fn deposit(&mut self, now: Timestamp, amount: ShareType) {
        self.policy.on_deposit(now, self.balance.amount, amount);
        self.balance.amount += amount;
    }

    /// Remove vested funds
    pub fn withdraw(&mut self, now: Timestamp, amount: ShareType) -> Result<(), ValidationError> {
        let allowed = self.allowed_withdraw(now);
        if amount > allowed {
            return Err(ValidationError::VestingLimit {
                requested: amount,
                allowed,
            });
        }
        self.policy.on_withdraw(now, self.balance.amount, amount);
        self.balance.amount -= amount;
        Ok(())
    }
}

impl Object for VestingBalanceObject {
    type Id = VestingBalanceId;
    type Key = ();
    const TYPE_NAME: &'static str = "vesting_balance";

    fn id(&self) -> VestingBalanceId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cdd(vesting_seconds: u32, start_claim: Timestamp) -> VestingBalanceObject {
        VestingBalanceObject::new(
            VestingBalanceId::new(0),
            AccountId::new(1),
            AssetId::CORE,
            VestingPolicy::Cdd(CddPolicy::new(vesting_seconds, start_claim, 0)),
        )
    }

    fn linear(cliff: u32, duration: u32) -> VestingBalanceObject {
        VestingBalanceObject::new(
            VestingBalanceId::new(0),
            AccountId::new(1),
            AssetId::CORE,
            VestingPolicy::from_initializer(
                &VestingPolicyInitializer::Linear {
                    begin_timestamp: 1_000,
                    vesting_cliff_seconds: cliff,
                    vesting_duration_seconds: duration,
                },
                0,
            ),
        )
    }

    // ==================== CDD tests ====================

    #[test]
    fn test_cdd_accrues_with_time() {
        let mut vb = cdd(100, 0);
        vb.deposit(0, 1_000);
        assert_eq!(vb.allowed_withdraw(0), 0);
        assert_eq!(vb.allowed_withdraw(10), 100);
        assert_eq!(vb.allowed_withdraw(50), 500);
        assert_eq!(vb.allowed_withdraw(100), 1_000);
        assert_eq!(vb.allowed_withdraw(10_000), 1_000);
    }

    #[test]
    fn test_cdd_nothing_before_start_claim() {
        let mut vb = cdd(100, 500);
        vb.deposit(0, 1_000);
        assert_eq!(vb.allowed_withdraw(499), 0);
        assert_eq!(vb.allowed_withdraw(500), 1_000);
    }

    #[test]
    fn test_cdd_withdraw_consumes_coin_seconds() {
        let mut vb = cdd(100, 0);
        vb.deposit(0, 1_000);
        vb.withdraw(50, 300).unwrap();
        assert_eq!(vb.balance.amount, 700);
        assert_eq!(vb.allowed_withdraw(50), 200);

        let err = vb.withdraw(50, 201).unwrap_err();
        assert_eq!(
            err,
            ValidationError::VestingLimit {
                requested: 201,
                allowed: 200
            }
        );
        assert_eq!(vb.balance.amount, 700);
    }

    #[test]
    fn test_cdd_deposit_accrues_at_old_balance() {
        let mut vb = cdd(100, 0);
        vb.deposit(0, 100);
        vb.deposit(50, 900);
        match &vb.policy {
            VestingPolicy::Cdd(policy) => {
                assert_eq!(policy.coin_seconds_earned, 100 * 50);
                assert_eq!(policy.coin_seconds_earned_last_update, 50);
            }
            other => panic!("unexpected policy {:?}", other),
        }
        assert_eq!(vb.allowed_withdraw(50), 50);
    }

    #[test]
    fn test_cdd_earned_is_capped() {
        let policy = CddPolicy::new(10, 0, 0);
        assert_eq!(policy.earned_at(1_000_000, 5), 50);
    }

    // ==================== Linear tests ====================

    #[test]
    fn test_linear_cliff_and_duration() {
        let mut vb = linear(100, 1_000);
        vb.deposit(1_000, 10_000);
        assert_eq!(vb.allowed_withdraw(1_050), 0);
        assert_eq!(vb.allowed_withdraw(1_100), 1_000);
        assert_eq!(vb.allowed_withdraw(1_500), 5_000);
        assert_eq!(vb.allowed_withdraw(3_000), 10_000);
    }

    #[test]
    fn test_linear_withdrawn_amount_counts() {
        let mut vb = linear(0, 1_000);
        vb.deposit(1_000, 1_000);
        vb.withdraw(1_500, 400).unwrap();
        assert_eq!(vb.allowed_withdraw(1_500), 100);
        assert_eq!(vb.allowed_withdraw(2_000), 600);
        assert!(vb.withdraw(1_500, 101).is_err());
    }
}
