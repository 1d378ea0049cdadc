use super::{check_fee, OperationBody};
use crate::asset::{Asset, Price};
use crate::chain_parameters::FULL_PERCENT;
use crate::error::{invalid, ProtocolResult};
use serde::{Deserialize, Serialize};
use strata_primitives::AccountId;

/// Offer to lend `amount`, or to borrow it against collateral.
///
/// A lender escrows `amount`; a borrower escrows the collateral that
/// `collateral_rate` prices `amount` at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBondOfferOperation {
    /// Fee
    pub fee: Asset,
    /// Offer creator, pays the fee
    pub creator: AccountId,
    /// True for a borrow offer, false for a lend offer
    pub offer_to_borrow: bool,
    /// Amount lent or borrowed
    pub amount: Asset,
    /// Price of `amount` in the collateral asset
    pub collateral_rate: Price,
    /// Shortest period before the loan may be repaid
    pub min_loan_period_sec: u32,
    /// Full loan period
    pub loan_period_sec: u32,
    /// Annual interest, in hundredths of a percent
    pub interest_apr: u16,
}

impl OperationBody for CreateBondOfferOperation {
    fn name(&self) -> &'static str {
        "create_bond_offer"
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
        self.collateral_rate.validate()?;
        if self.collateral_rate.base.asset_id != self.amount.asset_id
            && self.collateral_rate.quote.asset_id != self.amount.asset_id
        {
            return Err(invalid(self.name(), "collateral rate does not price the loan asset"));
        }
        if self.min_loan_period_sec == 0 || self.loan_period_sec < self.min_loan_period_sec {
            return Err(invalid(self.name(), "loan periods out of order"));
        }
        if self.interest_apr > FULL_PERCENT {
            return Err(invalid(self.name(), "interest above 100%"));
        }
        Ok(())
    }
}
