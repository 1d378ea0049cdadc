use super::{EvalContext, Evaluator, OperationResult, StagedDeltas, TransactionEvalState};
use crate::database::Database;
use crate::error::ChainResult;
use strata_protocol::operations::TransferOperation;
use strata_protocol::Asset;

/// Moves an amount between two accounts
pub struct TransferEvaluator;

impl Evaluator for TransferEvaluator {
    type Operation = TransferOperation;
    type Plan = ();

    fn validate(
        op: &TransferOperation,
        ctx: &EvalContext<'_>,
        staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        ctx.require(op.from)?;
        ctx.require(op.to)?;
        ctx.require(op.amount.asset_id)?;
        staged.adjust_balance(op.from, Asset::new(-op.amount.amount, op.amount.asset_id))?;
        staged.adjust_balance(op.to, op.amount)
    }

    fn commit(
        _op: &TransferOperation,
        _plan: (),
        _db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        Ok(OperationResult::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{apply_operation, validate_operation};
    use crate::error::{ChainError, ValidationError};
    use crate::test_utils::{genesis_db, signed_state};
    use bytes::Bytes;
    use strata_primitives::{AccountId, AssetId};
    use strata_protocol::{Operation, ProtocolError};

    fn transfer(from: AccountId, to: AccountId, amount: i64) -> Operation {
        TransferOperation {
            fee: Asset::core(20),
            from,
            to,
            amount: Asset::core(amount),
            memo: Bytes::new(),
        }
        .into()
    }

    #[test]
    fn test_transfer_moves_balance() {
        let (mut db, accounts) = genesis_db();
        let mut state = signed_state(&accounts.alice_key);
        let alice = db.get_balance(accounts.alice, AssetId::CORE);
        let bob = db.get_balance(accounts.bob, AssetId::CORE);

        apply_operation(&mut db, &mut state, &transfer(accounts.alice, accounts.bob, 500)).unwrap();
        assert_eq!(db.get_balance(accounts.alice, AssetId::CORE), alice - 520);
        assert_eq!(db.get_balance(accounts.bob, AssetId::CORE), bob + 500);
        assert_eq!(state.operation_results, vec![OperationResult::None]);
    }

    #[test]
    fn test_balance_must_cover_amount_plus_fee() {
        let (db, accounts) = genesis_db();
        let state = signed_state(&accounts.alice_key);
        let alice = db.get_balance(accounts.alice, AssetId::CORE);

        assert!(validate_operation(&db, &state, &transfer(accounts.alice, accounts.bob, alice - 20)).is_ok());
        assert!(matches!(
            validate_operation(&db, &state, &transfer(accounts.alice, accounts.bob, alice - 19)),
            Err(ChainError::Validation(ValidationError::InsufficientBalance { needed, .. })) if needed == alice + 1
        ));
    }

    #[test]
    fn test_transfer_to_self_or_unknown_rejected() {
        let (db, accounts) = genesis_db();
        let state = signed_state(&accounts.alice_key);
        assert!(matches!(
            validate_operation(&db, &state, &transfer(accounts.alice, accounts.alice, 1)),
            Err(ChainError::Protocol(ProtocolError::InvalidOperation { .. }))
        ));
        let ghost = AccountId::new(999);
        assert_eq!(
            validate_operation(&db, &state, &transfer(accounts.alice, ghost, 1)),
            Err(ChainError::Validation(ValidationError::NotFound(
                strata_primitives::TypedId::object_id(&ghost)
            )))
        );
    }
}
