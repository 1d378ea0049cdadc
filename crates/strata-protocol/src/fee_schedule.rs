//! Core-denominated fees per operation kind

use crate::error::{ProtocolError, ProtocolResult};
use crate::operations::Operation;
use serde::{Deserialize, Serialize};
use strata_primitives::{ShareType, MAX_SHARE_SUPPLY};

/// Bytes per billed data unit
pub const DATA_FEE_UNIT: usize = 1024;

/// Fee table, in core units
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Base transfer fee
    pub transfer_fee: ShareType,
    /// Per started kilobyte of memo or custom payload
    pub data_fee: ShareType,
    /// Key registration
    pub key_create_fee: ShareType,
    /// Account registration
    pub account_create_fee: ShareType,
    /// Surcharge for registering a prime account
    pub prime_account_fee: ShareType,
    /// Asset with a three-letter symbol
    pub asset_create_fee_3char: ShareType,
    /// Asset with a four-letter symbol
    pub asset_create_fee_4char: ShareType,
    /// Asset with a longer symbol
    pub asset_create_fee_long: ShareType,
    /// Issuing supply
    pub asset_issue_fee: ShareType,
    /// Funding a fee pool
    pub asset_fund_fee_pool_fee: ShareType,
    /// Limit order placement
    pub limit_order_create_fee: ShareType,
    /// Short order placement
    pub short_order_create_fee: ShareType,
    /// Order cancellation
    pub order_cancel_fee: ShareType,
    /// Delegate registration
    pub delegate_create_fee: ShareType,
    /// Witness registration
    pub witness_create_fee: ShareType,
    /// Bond offer
    pub create_bond_offer_fee: ShareType,
    /// Vesting balance creation
    pub vesting_balance_create_fee: ShareType,
    /// Vesting withdrawal
    pub vesting_balance_withdraw_fee: ShareType,
    /// Worker registration
    pub worker_create_fee: ShareType,
    /// Parameter update
    pub global_parameters_update_fee: ShareType,
    /// Base custom operation fee
    pub custom_fee: ShareType,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            transfer_fee: 20,
            data_fee: 10,
            key_create_fee: 10,
            account_create_fee: 50,
            prime_account_fee: 1_000,
            asset_create_fee_3char: 50_000,
            asset_create_fee_4char: 10_000,
            asset_create_fee_long: 1_000,
            asset_issue_fee: 20,
            asset_fund_fee_pool_fee: 20,
            limit_order_create_fee: 5,
            short_order_create_fee: 5,
            order_cancel_fee: 0,
            delegate_create_fee: 500,
            witness_create_fee: 500,
            create_bond_offer_fee: 5,
            vesting_balance_create_fee: 20,
            vesting_balance_withdraw_fee: 20,
            worker_create_fee: 500,
            global_parameters_update_fee: 0,
            custom_fee: 1,
        }
    }
}

impl FeeSchedule {
    /// A schedule that charges nothing
    pub fn zero() -> Self {
        Self {
            transfer_fee: 0,
            data_fee: 0,
            key_create_fee: 0,
            account_create_fee: 0,
            prime_account_fee: 0,
            asset_create_fee_3char: 0,
            asset_create_fee_4char: 0,
            asset_create_fee_long: 0,
            asset_issue_fee: 0,
            asset_fund_fee_pool_fee: 0,
            limit_order_create_fee: 0,
            short_order_create_fee: 0,
            order_cancel_fee: 0,
            delegate_create_fee: 0,
            witness_create_fee: 0,
            create_bond_offer_fee: 0,
            vesting_balance_create_fee: 0,
            vesting_balance_withdraw_fee: 0,
            worker_create_fee: 0,
            global_parameters_update_fee: 0,
            custom_fee: 0,
        }
    }

    fn all(&self) -> [ShareType; 21] {
        [
            self.transfer_fee,
            self.data_fee,
            self.key_create_fee,
            self.account_create_fee,
            self.prime_account_fee,
            self.asset_create_fee_3char,
            self.asset_create_fee_4char,
            self.asset_create_fee_long,
            self.asset_issue_fee,
            self.asset_fund_fee_pool_fee,
            self.limit_order_create_fee,
            self.short_order_create_fee,
            self.order_cancel_fee,
            self.delegate_create_fee,
            self.witness_create_fee,
            self.create_bond_offer_fee,
            self.vesting_balance_create_fee,
            self.vesting_balance_withdraw_fee,
            self.worker_create_fee,
            self.global_parameters_update_fee,
            self.custom_fee,
        ]
    }

    /// Every fee within `0..=MAX_SHARE_SUPPLY`
    pub fn validate(&self) -> ProtocolResult<()> {
        if self.all().iter().any(|fee| *fee < 0 || *fee > MAX_SHARE_SUPPLY) {
            return Err(ProtocolError::InvalidParameters(
                "fee out of range".to_string(),
            ));
        }
        Ok(())
    }

    /// Required fee for an operation, in core
    pub fn calculate_fee(&self, op: &Operation) -> ShareType {
        match op {
            Operation::Transfer(op) => self.transfer_fee.saturating_add(self.data_units(op.memo.len())),
            Operation::LimitOrderCreate(_) => self.limit_order_create_fee,
            Operation::LimitOrderCancel(_) => self.order_cancel_fee,
            Operation::ShortOrderCreate(_) => self.short_order_create_fee,
            Operation::ShortOrderCancel(_) => self.order_cancel_fee,
            Operation::KeyCreate(_) => self.key_create_fee,
            Operation::AccountCreate(op) => {
                let prime = if op.prime { self.prime_account_fee } else { 0 };
                self.account_create_fee + prime
            }
            Operation::DelegateCreate(_) => self.delegate_create_fee,
            Operation::WitnessCreate(_) => self.witness_create_fee,
            Operation::AssetCreate(op) => match op.symbol.len() {
                0..=3 => self.asset_create_fee_3char,
                4 => self.asset_create_fee_4char,
                _ => self.asset_create_fee_long,
            },
            Operation::AssetIssue(_) => self.asset_issue_fee,
            Operation::AssetFundFeePool(_) => self.asset_fund_fee_pool_fee,
            Operation::GlobalParametersUpdate(_) => self.global_parameters_update_fee,
            Operation::CreateBondOffer(_) => self.create_bond_offer_fee,
            Operation::VestingBalanceCreate(_) => self.vesting_balance_create_fee,
            Operation::VestingBalanceWithdraw(_) => self.vesting_balance_withdraw_fee,
            Operation::WorkerCreate(_) => self.worker_create_fee,
            Operation::Custom(op) => self.custom_fee.saturating_add(self.data_units(op.data.len())),
        }
    }

    fn data_units(&self, len: usize) -> ShareType {
        let units = len.div_ceil(DATA_FEE_UNIT) as ShareType;
        units.saturating_mul(self.data_fee)
    }
}
