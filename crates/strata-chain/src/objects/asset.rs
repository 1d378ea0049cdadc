//! Assets and their supply bookkeeping

use crate::object::Object;
use serde::{Deserialize, Serialize};
use strata_primitives::{AccountId, AssetDynamicDataId, AssetId, ShareType};
use strata_protocol::chain_parameters::FULL_PERCENT;
use strata_protocol::operations::AssetOptions;
use strata_protocol::Asset;

/// A registered asset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetObject {
    /// Id
    pub id: AssetId,
    /// Unique ticker symbol
    pub symbol: String,
    /// Issuer
    pub issuer: AccountId,
    /// Decimal places
    pub precision: u8,
    /// Issuer-controlled settings
    pub options: AssetOptions,
    /// Backing asset of a market-issued asset
    pub short_backing_asset: Option<AssetId>,
    /// Supply and fee pool
    pub dynamic_data: AssetDynamicDataId,
}

impl AssetObject {
    /// Whether supply is created by shorting rather than issuing
    pub fn is_market_issued(&self) -> bool {
        self.short_backing_asset.is_some()
    }

    /// Market fee charged on receiving `amount` of this asset, rounded down
    pub fn market_fee(&self, amount: ShareType) -> ShareType {
        if self.options.market_fee_percent == 0 || amount <= 0 {
            return 0;
        }
        let fee = amount as i128 * self.options.market_fee_percent as i128 / FULL_PERCENT as i128;
        fee as ShareType
    }

    /// An amount of this asset
    pub fn amount(&self, amount: ShareType) -> Asset {
        Asset::new(amount, self.id)
    }
}

impl Object for AssetObject {
    type Id = AssetId;
    type Key = String;
    const TYPE_NAME: &'static str = "asset";

    fn id(&self) -> AssetId {
        self.id
    }

    fn secondary_key(&self) -> Option<String> {
        Some(self.symbol.clone())
    }
}

/// Frequently changing asset state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDynamicDataObject {
    /// Id
    pub id: AssetDynamicDataId,
    /// Units in existence
    pub current_supply: ShareType,
    /// Fees collected in this asset
    pub accumulated_fees: ShareType,
    /// Core set aside to pay fees charged in this asset
    pub fee_pool: ShareType,
}

impl Object for AssetDynamicDataObject {
    type Id = AssetDynamicDataId;
    type Key = ();
    const TYPE_NAME: &'static str = "asset_dynamic_data";

    fn id(&self) -> AssetDynamicDataId {
        self.id
    }
}
