use super::{check_fee, OperationBody};
use crate::asset::{Asset, Price};
use crate::chain_parameters::{is_valid_symbol, FULL_PERCENT, MAX_ASSET_PRECISION};
use crate::error::{invalid, ProtocolResult};
use serde::{Deserialize, Serialize};
use strata_primitives::{AccountId, AssetId, ShareType, MAX_SHARE_SUPPLY};

/// Issuer-controlled asset settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetOptions {
    /// Supply may never exceed this
    pub max_supply: ShareType,
    /// Market fee, in hundredths of a percent of the amount received
    pub market_fee_percent: u16,
    /// Rate at which fees paid in this asset convert to core
    pub core_exchange_rate: Price,
}

impl AssetOptions {
    /// Range checks
    pub fn validate(&self, operation: &'static str) -> ProtocolResult<()> {
        if self.max_supply <= 0 || self.max_supply > MAX_SHARE_SUPPLY {
            return Err(invalid(operation, "max supply out of range"));
        }
        if self.market_fee_percent > FULL_PERCENT {
            return Err(invalid(operation, "market fee above 100%"));
        }
        self.core_exchange_rate.validate()?;
        if !self.core_exchange_rate.involves_core() {
            return Err(invalid(operation, "core exchange rate must be quoted against core"));
        }
        Ok(())
    }
}

/// Create a new asset.
///
/// The non-core side of `core_exchange_rate` may name any placeholder asset;
/// it is rebased to the new asset's id when the asset is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCreateOperation {
    /// Fee, scales with symbol length
    pub fee: Asset,
    /// Issuer, pays the fee
    pub issuer: AccountId,
    /// Unique ticker symbol
    pub symbol: String,
    /// Decimal places
    pub precision: u8,
    /// Settings
    pub common_options: AssetOptions,
    /// Backing asset if this is a market-issued asset
    pub short_backing_asset: Option<AssetId>,
}

impl OperationBody for AssetCreateOperation {
    fn name(&self) -> &'static str {
        "asset_create"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.issuer
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)?;
        if !is_valid_symbol(&self.symbol) {
            return Err(invalid(self.name(), format!("invalid symbol '{}'", self.symbol)));
        }
        if self.precision > MAX_ASSET_PRECISION {
            return Err(invalid(self.name(), "precision too large"));
        }
        self.common_options.validate(self.name())
    }
}

/// Issue new supply of a user-issued asset to an account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetIssueOperation {
    /// Fee
    pub fee: Asset,
    /// Must be the asset's issuer
    pub issuer: AccountId,
    /// Amount created
    pub asset_to_issue: Asset,
    /// Receiver
    pub issue_to_account: AccountId,
}

impl OperationBody for AssetIssueOperation {
    fn name(&self) -> &'static str {
        "asset_issue"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.issuer
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)?;
        if self.asset_to_issue.amount <= 0 || self.asset_to_issue.amount > MAX_SHARE_SUPPLY {
            return Err(invalid(self.name(), "issued amount out of range"));
        }
        if self.asset_to_issue.is_core() {
            return Err(invalid(self.name(), "core cannot be issued"));
        }
        Ok(())
    }
}

/// Move core from an account into an asset's fee pool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFundFeePoolOperation {
    /// Fee
    pub fee: Asset,
    /// Account funding the pool
    pub from_account: AccountId,
    /// Pool to fund
    pub asset_id: AssetId,
    /// Core amount
    pub amount: ShareType,
}

impl OperationBody for AssetFundFeePoolOperation {
    fn name(&self) -> &'static str {
        "asset_fund_fee_pool"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.from_account
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)?;
        if self.amount <= 0 {
            return Err(invalid(self.name(), "amount must be positive"));
        }
        Ok(())
    }
}
