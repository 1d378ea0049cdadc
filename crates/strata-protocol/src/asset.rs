//! Asset amounts and prices

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use strata_primitives::{AssetId, ShareType, MAX_SHARE_SUPPLY};

/// An amount of one asset
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Asset {
    /// Amount in the asset's smallest unit
    pub amount: ShareType,
    /// Which asset
    pub asset_id: AssetId,
}

impl Asset {
    /// Create an amount of an asset
    pub const fn new(amount: ShareType, asset_id: AssetId) -> Self {
        Self { amount, asset_id }
    }

    /// Amount of the core asset
    pub const fn core(amount: ShareType) -> Self {
        Self::new(amount, AssetId::CORE)
    }

    /// Whether this is an amount of the core asset
    pub fn is_core(&self) -> bool {
        self.asset_id == AssetId::CORE
    }

    /// Add an amount of the same asset
    pub fn checked_add(&self, other: &Asset) -> Option<Asset> {
        if self.asset_id != other.asset_id {
            return None;
        }
        self.amount
            .checked_add(other.amount)
            .map(|amount| Asset::new(amount, self.asset_id))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.asset_id)
    }
}

/// Exchange rate between two assets: `base` is worth `quote`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    /// Base side
    pub base: Asset,
    /// Quote side
    pub quote: Asset,
}

impl Price {
    /// Create a price
    pub const fn new(base: Asset, quote: Asset) -> Self {
        Self { base, quote }
    }

    /// One unit of `asset_id` per unit of core
    pub const fn unit(asset_id: AssetId) -> Self {
        Self::new(Asset::new(1, asset_id), Asset::core(1))
    }

    /// Both amounts positive and within supply; distinct assets unless both are core
    pub fn validate(&self) -> ProtocolResult<()> {
        for side in [&self.base, &self.quote] {
            if side.amount <= 0 || side.amount > MAX_SHARE_SUPPLY {
                return Err(ProtocolError::InvalidPrice(format!(
                    "amount {} out of range",
                    side.amount
                )));
            }
        }
        if self.base.asset_id == self.quote.asset_id && !self.base.is_core() {
            return Err(ProtocolError::InvalidPrice(
                "base and quote are the same asset".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether one side of the price is the core asset
    pub fn involves_core(&self) -> bool {
        self.base.is_core() || self.quote.is_core()
    }

    /// Convert an amount of either side into the other side, rounding down
    pub fn convert(&self, asset: &Asset) -> ProtocolResult<Asset> {
        let (from, to) = if asset.asset_id == self.base.asset_id {
            (&self.base, &self.quote)
        } else if asset.asset_id == self.quote.asset_id {
            (&self.quote, &self.base)
        } else {
            return Err(ProtocolError::PriceMismatch {
                asset: asset.asset_id.to_string(),
                base: self.base.asset_id.to_string(),
                quote: self.quote.asset_id.to_string(),
            });
        };
        if from.amount <= 0 {
            return Err(ProtocolError::InvalidPrice("zero base amount".to_string()));
        }
        let amount = asset.amount as i128 * to.amount as i128 / from.amount as i128;
        let amount = ShareType::try_from(amount).map_err(|_| ProtocolError::Overflow)?;
        Ok(Asset::new(amount, to.asset_id))
    }

    /// Replace every non-core side with `asset_id`
    pub fn rebased(&self, asset_id: AssetId) -> Price {
        let rebase = |side: &Asset| {
            if side.is_core() {
                *side
            } else {
                Asset::new(side.amount, asset_id)
            }
        };
        Price::new(rebase(&self.base), rebase(&self.quote))
    }
}
