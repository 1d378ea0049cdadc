//! Deltas staged during validation and applied at commit.
//!
//! Validation only reads the database; every balance, fee pool, fee and
//! treasury movement an operation implies is recorded here instead. The
//! projection `database + deltas` is checked for negative holdings before
//! the operation may commit.

use crate::database::Database;
use crate::error::{ChainResult, ValidationError};
use std::collections::BTreeMap;
use strata_primitives::{AccountId, AssetId, ShareType};
use strata_protocol::{Asset, ProtocolError};

/// Pending movements of one operation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StagedDeltas {
    balances: BTreeMap<(AccountId, AssetId), ShareType>,
    fee_pools: BTreeMap<AssetId, ShareType>,
    accumulated_fees: BTreeMap<AssetId, ShareType>,
    supply: BTreeMap<AssetId, ShareType>,
    treasury: ShareType,
}

fn add(slot: &mut ShareType, delta: ShareType) -> ChainResult<()> {
    *slot = slot.checked_add(delta).ok_or(ProtocolError::Overflow)?;
    Ok(())
}

impl StagedDeltas {
    /// Nothing staged
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
            && self.fee_pools.is_empty()
            && self.accumulated_fees.is_empty()
            && self.supply.is_empty()
            && self.treasury == 0
    }

    /// Move `delta` into (or, negative, out of) an account
    pub fn adjust_balance(&mut self, account: AccountId, delta: Asset) -> ChainResult<()> {
        add(
            self.balances.entry((account, delta.asset_id)).or_default(),
            delta.amount,
        )
    }

    /// Change the core held in an asset's fee pool
    pub fn adjust_fee_pool(&mut self, asset: AssetId, delta: ShareType) -> ChainResult<()> {
        add(self.fee_pools.entry(asset).or_default(), delta)
    }

    /// Change the fees an asset has collected in itself
    pub fn adjust_accumulated_fees(&mut self, asset: AssetId, delta: ShareType) -> ChainResult<()> {
        add(self.accumulated_fees.entry(asset).or_default(), delta)
    }

    /// Change an asset's current supply
    pub fn adjust_supply(&mut self, asset: AssetId, delta: ShareType) -> ChainResult<()> {
        add(self.supply.entry(asset).or_default(), delta)
    }

    /// Change the treasury
    pub fn adjust_treasury(&mut self, delta: ShareType) -> ChainResult<()> {
        add(&mut self.treasury, delta)
    }

    /// Staged change to an account's balance
    pub fn balance_delta(&self, account: AccountId, asset: AssetId) -> ShareType {
        self.balances.get(&(account, asset)).copied().unwrap_or(0)
    }

    /// Balance the account would hold after these deltas
    pub fn projected_balance(&self, db: &Database, account: AccountId, asset: AssetId) -> ShareType {
        db.get_balance(account, asset)
            .saturating_add(self.balance_delta(account, asset))
    }

    /// Every projected holding must stay non-negative
    pub fn check(&self, db: &Database) -> ChainResult<()> {
        for (&(account, asset), &delta) in &self.balances {
            let balance = db.get_balance(account, asset);
            if balance.saturating_add(delta) < 0 {
                return Err(ValidationError::InsufficientBalance {
                    account,
                    asset,
                    balance,
                    needed: -delta,
                }
                .into());
            }
        }
        for (&asset, &delta) in &self.fee_pools {
            let available = db.get(db.get(asset)?.dynamic_data)?.fee_pool;
            if available.saturating_add(delta) < 0 {
                return Err(ValidationError::FeePoolExhausted {
                    asset,
                    needed: -delta,
                    available,
                }
                .into());
            }
        }
        let treasury = db.get_dynamic_global_properties()?.treasury;
        if treasury.saturating_add(self.treasury) < 0 {
            return Err(ValidationError::Precondition(format!(
                "treasury of {} cannot pay {}",
                treasury, -self.treasury
            ))
            .into());
        }
        Ok(())
    }

    /// Write the deltas into the database
    pub(crate) fn apply(self, db: &mut Database) -> ChainResult<()> {
        for ((account, asset), delta) in self.balances {
            db.adjust_balance(account, Asset::new(delta, asset))?;
        }
        for (asset, delta) in self.fee_pools {
            db.modify_asset_dynamic_data(asset, |d| d.fee_pool += delta)?;
        }
        for (asset, delta) in self.accumulated_fees {
            db.modify_asset_dynamic_data(asset, |d| d.accumulated_fees += delta)?;
        }
        for (asset, delta) in self.supply {
            db.modify_asset_dynamic_data(asset, |d| d.current_supply += delta)?;
        }
        if self.treasury != 0 {
            db.adjust_treasury(self.treasury)?;
        }
        Ok(())
    }
}
