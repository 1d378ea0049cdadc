use super::{EvalContext, Evaluator, OperationResult, StagedDeltas, TransactionEvalState};
use crate::database::Database;
use crate::error::ChainResult;
use strata_protocol::operations::CustomOperation;

/// Charges the fee and otherwise does nothing
pub struct CustomEvaluator;

impl Evaluator for CustomEvaluator {
    type Operation = CustomOperation;
    type Plan = ();

    fn validate(
        _op: &CustomOperation,
        _ctx: &EvalContext<'_>,
        _staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        Ok(())
    }

    fn commit(
        _op: &CustomOperation,
        _plan: (),
        _db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        Ok(OperationResult::None)
    }
}
