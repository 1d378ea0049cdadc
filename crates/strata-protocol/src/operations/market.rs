use super::{check_fee, OperationBody};
use crate::asset::Asset;
use crate::chain_parameters::{MAX_COLLATERAL_RATIO, MIN_COLLATERAL_RATIO};
use crate::error::{invalid, ProtocolResult};
use serde::{Deserialize, Serialize};
use strata_primitives::{AccountId, LimitOrderId, ShortOrderId, Timestamp};

/// Offer `amount_to_sell` for at least `min_to_receive`, escrowing the sold funds
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderCreateOperation {
    /// Fee
    pub fee: Asset,
    /// Seller, pays the fee
    pub seller: AccountId,
    /// Funds escrowed by the order
    pub amount_to_sell: Asset,
    /// Least the seller accepts in return
    pub min_to_receive: Asset,
    /// Order expires and is refunded at this time
    pub expiration: Timestamp,
}

impl OperationBody for LimitOrderCreateOperation {
    fn name(&self) -> &'static str {
        "limit_order_create"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.seller
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)?;
        if self.amount_to_sell.asset_id == self.min_to_receive.asset_id {
            return Err(invalid(self.name(), "cannot trade an asset for itself"));
        }
        if self.amount_to_sell.amount <= 0 || self.min_to_receive.amount <= 0 {
            return Err(invalid(self.name(), "amounts must be positive"));
        }
        Ok(())
    }
}

/// Cancel a limit order and refund its escrow
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderCancelOperation {
    /// Fee
    pub fee: Asset,
    /// Must be the order's seller
    pub fee_paying_account: AccountId,
    /// Order to cancel
    pub order: LimitOrderId,
}

impl OperationBody for LimitOrderCancelOperation {
    fn name(&self) -> &'static str {
        "limit_order_cancel"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.fee_paying_account
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)
    }
}

/// Short a market-issued asset, escrowing collateral in its backing asset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortOrderCreateOperation {
    /// Fee
    pub fee: Asset,
    /// Seller, pays the fee
    pub seller: AccountId,
    /// Market-issued asset being shorted
    pub amount_to_sell: Asset,
    /// Collateral escrowed, in the asset's backing asset
    pub collateral: Asset,
    /// Collateral ratio of a newly opened position, per mille
    pub initial_collateral_ratio: u16,
    /// Collateral ratio below which a position is called, per mille
    pub maintenance_collateral_ratio: u16,
    /// Order expires and is refunded at this time
    pub expiration: Timestamp,
}

impl OperationBody for ShortOrderCreateOperation {
    fn name(&self) -> &'static str {
        "short_order_create"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.seller
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)?;
        if self.amount_to_sell.asset_id == self.collateral.asset_id {
            return Err(invalid(self.name(), "collateral must differ from the shorted asset"));
        }
        if self.amount_to_sell.amount <= 0 || self.collateral.amount <= 0 {
            return Err(invalid(self.name(), "amounts must be positive"));
        }
        if self.maintenance_collateral_ratio < MIN_COLLATERAL_RATIO
            || self.maintenance_collateral_ratio > MAX_COLLATERAL_RATIO
        {
            return Err(invalid(self.name(), "maintenance collateral ratio out of range"));
        }
        if self.initial_collateral_ratio < self.maintenance_collateral_ratio
            || self.initial_collateral_ratio > MAX_COLLATERAL_RATIO
        {
            return Err(invalid(self.name(), "initial collateral ratio out of range"));
        }
        Ok(())
    }
}

/// Cancel a short order and refund its collateral
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortOrderCancelOperation {
    /// Fee
    pub fee: Asset,
    /// Must be the order's seller
    pub fee_paying_account: AccountId,
    /// Order to cancel
    pub order: ShortOrderId,
}

impl OperationBody for ShortOrderCancelOperation {
    fn name(&self) -> &'static str {
        "short_order_cancel"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.fee_paying_account
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)
    }
}
