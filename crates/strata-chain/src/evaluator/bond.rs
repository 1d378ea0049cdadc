use super::{EvalContext, Evaluator, OperationResult, StagedDeltas, TransactionEvalState};
use crate::database::Database;
use crate::error::ChainResult;
use crate::objects::BondOfferObject;
use strata_primitives::TypedId;
use strata_protocol::operations::CreateBondOfferOperation;
use strata_protocol::Asset;

/// Posts a lending or borrowing offer.
///
/// A lender escrows the amount offered; a borrower escrows the collateral
/// that amount is worth at the offer's collateral rate.
pub struct CreateBondOfferEvaluator;

impl Evaluator for CreateBondOfferEvaluator {
    type Operation = CreateBondOfferOperation;
    /// Escrowed funds
    type Plan = Asset;

    fn validate(
        op: &CreateBondOfferOperation,
        ctx: &EvalContext<'_>,
        staged: &mut StagedDeltas,
    ) -> ChainResult<Asset> {
        ctx.require(op.creator)?;
        ctx.require(op.amount.asset_id)?;
        let escrow = if op.offer_to_borrow {
            op.collateral_rate.convert(&op.amount)?
        } else {
            op.amount
        };
        ctx.require(escrow.asset_id)?;
        staged.adjust_balance(op.creator, Asset::new(-escrow.amount, escrow.asset_id))?;
        Ok(escrow)
    }

    fn commit(
        op: &CreateBondOfferOperation,
        escrow: Asset,
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        let id = db.create::<BondOfferObject, _>(|id| BondOfferObject {
            id,
            creator: op.creator,
            offer_to_borrow: op.offer_to_borrow,
            amount: op.amount,
            escrow,
            collateral_rate: op.collateral_rate,
            min_loan_period_sec: op.min_loan_period_sec,
            loan_period_sec: op.loan_period_sec,
            interest_apr: op.interest_apr,
        })?;
        Ok(OperationResult::ObjectId(id.object_id()))
    }
}
