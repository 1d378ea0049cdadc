use super::{EvalContext, Evaluator, OperationResult, StagedDeltas, TransactionEvalState};
use crate::database::Database;
use crate::error::{ChainResult, ValidationError};
use crate::objects::{VestingBalanceObject, VestingPolicy};
use strata_primitives::TypedId;
use strata_protocol::operations::{VestingBalanceCreateOperation, VestingBalanceWithdrawOperation};
use strata_protocol::Asset;

/// Locks funds from the creator under a release policy
pub struct VestingBalanceCreateEvaluator;

impl Evaluator for VestingBalanceCreateEvaluator {
    type Operation = VestingBalanceCreateOperation;
    type Plan = ();

    fn validate(
        op: &VestingBalanceCreateOperation,
        ctx: &EvalContext<'_>,
        staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        ctx.require(op.creator)?;
        ctx.require(op.owner)?;
        ctx.require(op.amount.asset_id)?;
        staged.adjust_balance(op.creator, Asset::new(-op.amount.amount, op.amount.asset_id))
    }

    fn commit(
        op: &VestingBalanceCreateOperation,
        _plan: (),
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        let now = db.head_block_time()?;
        let id = db.create::<VestingBalanceObject, _>(|id| {
            let policy = VestingPolicy::from_initializer(&op.policy, now);
            let mut balance = VestingBalanceObject::new(id, op.owner, op.amount.asset_id, policy);
            balance.deposit(now, op.amount.amount);
            balance
        })?;
        Ok(OperationResult::ObjectId(id.object_id()))
    }
}

/// Releases vested funds to the balance's owner
pub struct VestingBalanceWithdrawEvaluator;

impl Evaluator for VestingBalanceWithdrawEvaluator {
    type Operation = VestingBalanceWithdrawOperation;
    type Plan = ();

    fn validate(
        op: &VestingBalanceWithdrawOperation,
        ctx: &EvalContext<'_>,
        staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        let vesting = ctx.require(op.vesting_balance)?;
        if vesting.owner != op.owner {
            return Err(ValidationError::NotOwner {
                object: op.vesting_balance.object_id(),
                account: op.owner,
            }
            .into());
        }
        if vesting.balance.asset_id != op.amount.asset_id {
            return Err(ValidationError::InvalidAsset {
                asset: op.amount.asset_id,
                reason: "does not match the vesting balance",
            }
            .into());
        }
        let allowed = vesting.allowed_withdraw(ctx.now()?);
        if op.amount.amount > allowed {
            return Err(ValidationError::VestingLimit {
                requested: op.amount.amount,
                allowed,
            }
            .into());
        }
        staged.adjust_balance(op.owner, op.amount)
    }

    fn commit(
        op: &VestingBalanceWithdrawOperation,
        _plan: (),
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        let now = db.head_block_time()?;
        let mut outcome = Ok(());
        db.modify(op.vesting_balance, |v| outcome = v.withdraw(now, op.amount.amount))?;
        outcome?;
        Ok(OperationResult::None)
    }
}
