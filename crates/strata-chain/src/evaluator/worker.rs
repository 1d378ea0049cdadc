use super::{EvalContext, Evaluator, OperationResult, StagedDeltas, TransactionEvalState};
use crate::database::Database;
use crate::error::{ChainResult, ValidationError};
use crate::objects::{CddPolicy, VestingBalanceObject, VestingPolicy, WorkerObject, WorkerPayPolicy};
use strata_primitives::{AssetId, TypedId, VoteCategory, SECONDS_PER_DAY};
use strata_protocol::operations::{WorkerCreateOperation, WorkerInitializer};
use strata_protocol::ProtocolError;

/// Registers a worker paid from the treasury at maintenance
pub struct WorkerCreateEvaluator;

impl Evaluator for WorkerCreateEvaluator {
    type Operation = WorkerCreateOperation;
    type Plan = ();

    fn validate(
        op: &WorkerCreateOperation,
        ctx: &EvalContext<'_>,
        _staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        ctx.require(op.owner)?;
        let now = ctx.now()?;
        if op.work_begin_date < now {
            return Err(ValidationError::Expired {
                expiration: op.work_begin_date,
                now,
            }
            .into());
        }
        Ok(())
    }

    fn commit(
        op: &WorkerCreateOperation,
        _plan: (),
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        let now = db.head_block_time()?;
        let vote_for = db.register_candidate(VoteCategory::Worker, op.owner)?;
        let pay_policy = match op.initializer {
            WorkerInitializer::Refund => WorkerPayPolicy::Refund { total_burned: 0 },
            WorkerInitializer::Vesting {
                pay_vesting_period_days,
            } => {
                let vesting_seconds = u32::from(pay_vesting_period_days)
                    .checked_mul(SECONDS_PER_DAY)
                    .ok_or(ProtocolError::Overflow)?;
                let balance = db.create::<VestingBalanceObject, _>(|id| {
                    let policy = VestingPolicy::Cdd(CddPolicy::new(vesting_seconds, now, now));
                    VestingBalanceObject::new(id, op.owner, AssetId::CORE, policy)
                })?;
                WorkerPayPolicy::Vesting { balance }
            }
        };
        let id = db.create::<WorkerObject, _>(|id| WorkerObject {
            id,
            worker_account: op.owner,
            work_begin_date: op.work_begin_date,
            work_end_date: op.work_end_date,
            daily_pay: op.daily_pay,
            name: op.name.clone(),
            url: op.url.clone(),
            pay_policy,
            vote_for,
        })?;
        Ok(OperationResult::ObjectId(id.object_id()))
    }
}
