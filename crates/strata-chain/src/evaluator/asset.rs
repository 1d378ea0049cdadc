//! Asset creation, issuance and fee pool funding

use super::{EvalContext, Evaluator, OperationResult, StagedDeltas, TransactionEvalState};
use crate::database::Database;
use crate::error::{ChainResult, ValidationError};
use crate::objects::{AssetDynamicDataObject, AssetObject};
use strata_primitives::TypedId;
use strata_protocol::operations::{
    AssetCreateOperation, AssetFundFeePoolOperation, AssetIssueOperation,
};
use strata_protocol::Asset;

/// Creates a user-issued or market-issued asset under a unique symbol
pub struct AssetCreateEvaluator;

impl Evaluator for AssetCreateEvaluator {
    type Operation = AssetCreateOperation;
    type Plan = ();

    fn validate(
        op: &AssetCreateOperation,
        ctx: &EvalContext<'_>,
        _staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        ctx.require(op.issuer)?;
        if ctx.db.find_by_key::<AssetObject>(&op.symbol).is_some() {
            return Err(ValidationError::DuplicateSymbol(op.symbol.clone()).into());
        }
        if let Some(backing) = op.short_backing_asset {
            ctx.require(backing)?;
        }
        Ok(())
    }

    fn commit(
        op: &AssetCreateOperation,
        _plan: (),
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        let dynamic_data = db.create::<AssetDynamicDataObject, _>(|id| AssetDynamicDataObject {
            id,
            ..Default::default()
        })?;
        let id = db.create::<AssetObject, _>(|id| {
            let mut options = op.common_options.clone();
            options.core_exchange_rate = options.core_exchange_rate.rebased(id);
            AssetObject {
                id,
                symbol: op.symbol.clone(),
                issuer: op.issuer,
                precision: op.precision,
                options,
                short_backing_asset: op.short_backing_asset,
                dynamic_data,
            }
        })?;
        Ok(OperationResult::ObjectId(id.object_id()))
    }
}

/// Issues new supply of a user-issued asset to an account
pub struct AssetIssueEvaluator;

impl Evaluator for AssetIssueEvaluator {
    type Operation = AssetIssueOperation;
    type Plan = ();

    fn validate(
        op: &AssetIssueOperation,
        ctx: &EvalContext<'_>,
        staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        let asset_id = op.asset_to_issue.asset_id;
        let asset = ctx.require(asset_id)?;
        if asset.issuer != op.issuer {
            return Err(ValidationError::NotOwner {
                object: asset_id.object_id(),
                account: op.issuer,
            }
            .into());
        }
        if asset.is_market_issued() {
            return Err(ValidationError::InvalidAsset {
                asset: asset_id,
                reason: "market-issued supply is created by shorting",
            }
            .into());
        }
        ctx.require(op.issue_to_account)?;

        let supply = ctx.require(asset.dynamic_data)?.current_supply;
        let max_supply = asset.options.max_supply;
        if supply.saturating_add(op.asset_to_issue.amount) > max_supply {
            return Err(ValidationError::SupplyExceeded {
                asset: asset_id,
                max_supply,
            }
            .into());
        }
        staged.adjust_supply(asset_id, op.asset_to_issue.amount)?;
        staged.adjust_balance(op.issue_to_account, op.asset_to_issue)
    }

    fn commit(
        _op: &AssetIssueOperation,
        _plan: (),
        _db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        Ok(OperationResult::None)
    }
}

/// Moves core from an account into an asset's fee pool
pub struct AssetFundFeePoolEvaluator;

impl Evaluator for AssetFundFeePoolEvaluator {
    type Operation = AssetFundFeePoolOperation;
    type Plan = ();

    fn validate(
        op: &AssetFundFeePoolOperation,
        ctx: &EvalContext<'_>,
        staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        ctx.require(op.asset_id)?;
        staged.adjust_balance(op.from_account, Asset::core(-op.amount))?;
        staged.adjust_fee_pool(op.asset_id, op.amount)
    }

    fn commit(
        _op: &AssetFundFeePoolOperation,
        _plan: (),
        _db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        Ok(OperationResult::None)
    }
}
