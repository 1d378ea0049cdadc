use super::{EvalContext, Evaluator, OperationResult, StagedDeltas, TransactionEvalState};
use crate::database::Database;
use crate::error::{ChainResult, ValidationError};
use strata_primitives::GlobalPropertyId;
use strata_protocol::operations::GlobalParametersUpdateOperation;

/// Stages new chain parameters for the next maintenance pass.
///
/// Only accepted inside a committee-approved (proposed) transaction.
pub struct GlobalParametersUpdateEvaluator;

impl Evaluator for GlobalParametersUpdateEvaluator {
    type Operation = GlobalParametersUpdateOperation;
    type Plan = ();

    fn validate(
        _op: &GlobalParametersUpdateOperation,
        ctx: &EvalContext<'_>,
        _staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        if !ctx.state.is_proposed_trx {
            return Err(ValidationError::NotProposed.into());
        }
        Ok(())
    }

    fn commit(
        op: &GlobalParametersUpdateOperation,
        _plan: (),
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        db.modify(GlobalPropertyId::new(0), |g| {
            g.pending_parameters = Some(op.new_parameters.clone())
        })?;
        Ok(OperationResult::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;
    use crate::evaluator::{apply_operation, validate_operation};
    use crate::test_utils::{genesis_db, signed_state};
    use strata_protocol::{Asset, ChainParameters, Operation};

    fn update(block_interval: u8) -> Operation {
        GlobalParametersUpdateOperation {
            fee: Asset::core(0),
            new_parameters: ChainParameters {
                block_interval,
                maintenance_interval: 600,
                ..Default::default()
            },
        }
        .into()
    }

    #[test]
    fn test_requires_proposed_transaction() {
        let (db, accounts) = genesis_db();
        let state = signed_state(&accounts.alice_key);
        assert_eq!(
            validate_operation(&db, &state, &update(10)),
            Err(ChainError::Validation(ValidationError::NotProposed))
        );
    }

    #[test]
    fn test_stages_without_activating() {
        let (mut db, _) = genesis_db();
        let active = db.get_global_properties().unwrap().parameters.clone();
        let mut state = TransactionEvalState::proposed();

        apply_operation(&mut db, &mut state, &update(10)).unwrap();
        let props = db.get_global_properties().unwrap();
        assert_eq!(props.parameters, active);
        assert_eq!(props.pending_parameters.as_ref().unwrap().block_interval, 10);
    }

    #[test]
    fn test_insane_parameters_rejected() {
        let (db, _) = genesis_db();
        let state = TransactionEvalState::proposed();
        assert!(matches!(
            validate_operation(&db, &state, &update(0)),
            Err(ChainError::Protocol(_))
        ));
    }
}
