//! Escrowed market positions: limit orders, short orders and bond offers.
//!
//! Orders are never matched. They hold their escrow until cancelled or
//! expired, when it is refunded to the seller.

use crate::object::Object;
use serde::{Deserialize, Serialize};
use strata_primitives::{AccountId, BondOfferId, LimitOrderId, ShareType, ShortOrderId, Timestamp};
use strata_protocol::{Asset, Price};

/// Offer to sell at a limit price
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderObject {
    /// Id
    pub id: LimitOrderId,
    /// Seller
    pub seller: AccountId,
    /// Escrowed amount of `sell_price.base`'s asset
    pub for_sale: ShareType,
    /// `base` offered for at least `quote`
    pub sell_price: Price,
    /// Refunded at this time
    pub expiration: Timestamp,
    /// Market fee owed on the receiving asset once filled
    pub deferred_market_fee: ShareType,
}

impl LimitOrderObject {
    /// Escrowed amount
    pub fn amount_for_sale(&self) -> Asset {
        Asset::new(self.for_sale, self.sell_price.base.asset_id)
    }
}

impl Object for LimitOrderObject {
    type Id = LimitOrderId;
    type Key = ();
    const TYPE_NAME: &'static str = "limit_order";

    fn id(&self) -> LimitOrderId {
        self.id
    }
}

/// Offer to short a market-issued asset against collateral
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortOrderObject {
    /// Id
    pub id: ShortOrderId,
    /// Seller
    pub seller: AccountId,
    /// Market-issued asset offered
    pub amount_to_sell: Asset,
    /// Escrowed collateral in the backing asset
    pub collateral: Asset,
    /// Per mille
    pub initial_collateral_ratio: u16,
    /// Per mille
    pub maintenance_collateral_ratio: u16,
    /// Refunded at this time
    pub expiration: Timestamp,
    /// Market fee owed on the backing asset once filled
    pub deferred_market_fee: ShareType,
}

impl Object for ShortOrderObject {
    type Id = ShortOrderId;
    type Key = ();
    const TYPE_NAME: &'static str = "short_order";

    fn id(&self) -> ShortOrderId {
        self.id
    }
}

/// Open offer to lend or borrow
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondOfferObject {
    /// Id
    pub id: BondOfferId,
    /// Creator
    pub creator: AccountId,
    /// Borrow offer if true, lend offer otherwise
    pub offer_to_borrow: bool,
    /// Amount lent or borrowed
    pub amount: Asset,
    /// Funds held by the offer: the loan for lenders, collateral for borrowers
    pub escrow: Asset,
    /// Price of `amount` in the collateral asset
    pub collateral_rate: Price,
    /// Seconds
    pub min_loan_period_sec: u32,
    /// Seconds
    pub loan_period_sec: u32,
    /// Hundredths of a percent
    pub interest_apr: u16,
}

impl Object for BondOfferObject {
    type Id = BondOfferId;
    type Key = ();
    const TYPE_NAME: &'static str = "bond_offer";

    fn id(&self) -> BondOfferId {
        self.id
    }
}
