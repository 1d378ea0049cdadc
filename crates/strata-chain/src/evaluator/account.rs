//! Keys, accounts and the accounts' block-producing and committee roles

use super::{EvalContext, Evaluator, OperationResult, StagedDeltas, TransactionEvalState};
use crate::database::Database;
use crate::error::{ChainResult, ValidationError};
use crate::objects::{AccountObject, DelegateObject, KeyObject, WitnessObject};
use strata_primitives::{TypedId, VoteCategory, H256};
use strata_protocol::operations::{
    AccountCreateOperation, DelegateCreateOperation, KeyCreateOperation, WitnessCreateOperation,
};
use strata_protocol::Authority;

/// Registers a key
pub struct KeyCreateEvaluator;

impl Evaluator for KeyCreateEvaluator {
    type Operation = KeyCreateOperation;
    type Plan = ();

    fn validate(
        op: &KeyCreateOperation,
        ctx: &EvalContext<'_>,
        _staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        ctx.require(op.fee_paying_account)?;
        Ok(())
    }

    fn commit(
        op: &KeyCreateOperation,
        _plan: (),
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        let id = db.create::<KeyObject, _>(|id| KeyObject {
            id,
            key_data: op.key_data,
        })?;
        Ok(OperationResult::ObjectId(id.object_id()))
    }
}

fn check_authority_keys(
    ctx: &EvalContext<'_>,
    authority: &Authority,
    max_membership: u16,
) -> ChainResult<()> {
    if authority.keys.len() > max_membership as usize {
        return Err(ValidationError::Precondition(format!(
            "authority lists {} keys, at most {} allowed",
            authority.keys.len(),
            max_membership
        ))
        .into());
    }
    for key in authority.keys.keys() {
        ctx.require(*key)?;
    }
    Ok(())
}

/// Registers an account under a unique name
pub struct AccountCreateEvaluator;

impl Evaluator for AccountCreateEvaluator {
    type Operation = AccountCreateOperation;
    type Plan = ();

    fn validate(
        op: &AccountCreateOperation,
        ctx: &EvalContext<'_>,
        _staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        let registrar = ctx.require(op.registrar)?;
        if ctx.db.find_by_key::<AccountObject>(&op.name).is_some() {
            return Err(ValidationError::DuplicateName(op.name.clone()).into());
        }
        if op.prime && !registrar.prime {
            return Err(ValidationError::NotPrime(op.registrar).into());
        }
        let max_membership = ctx.parameters()?.maximum_authority_membership;
        check_authority_keys(ctx, &op.owner, max_membership)?;
        check_authority_keys(ctx, &op.active, max_membership)?;
        ctx.require(op.memo_key)?;
        Ok(())
    }

    fn commit(
        op: &AccountCreateOperation,
        _plan: (),
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        let id = db.create::<AccountObject, _>(|id| AccountObject {
            id,
            name: op.name.clone(),
            owner: op.owner.clone(),
            active: op.active.clone(),
            memo_key: Some(op.memo_key),
            prime: op.prime,
            registrar: op.registrar,
        })?;
        Ok(OperationResult::ObjectId(id.object_id()))
    }
}

/// Registers a prime account as a committee delegate
pub struct DelegateCreateEvaluator;

impl Evaluator for DelegateCreateEvaluator {
    type Operation = DelegateCreateOperation;
    type Plan = ();

    fn validate(
        op: &DelegateCreateOperation,
        ctx: &EvalContext<'_>,
        _staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        let account = ctx.require(op.delegate_account)?;
        if !account.prime {
            return Err(ValidationError::NotPrime(op.delegate_account).into());
        }
        if ctx
            .db
            .find_by_key::<DelegateObject>(&op.delegate_account)
            .is_some()
        {
            return Err(ValidationError::AlreadyRegistered {
                account: op.delegate_account,
                role: "delegate",
            }
            .into());
        }
        Ok(())
    }

    fn commit(
        op: &DelegateCreateOperation,
        _plan: (),
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        let vote_id = db.register_candidate(VoteCategory::Committee, op.delegate_account)?;
        let id = db.create::<DelegateObject, _>(|id| DelegateObject {
            id,
            delegate_account: op.delegate_account,
            vote_id,
        })?;
        Ok(OperationResult::ObjectId(id.object_id()))
    }
}

/// Registers an account as a block-producing witness
pub struct WitnessCreateEvaluator;

impl Evaluator for WitnessCreateEvaluator {
    type Operation = WitnessCreateOperation;
    type Plan = ();

    fn validate(
        op: &WitnessCreateOperation,
        ctx: &EvalContext<'_>,
        _staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        ctx.require(op.witness_account)?;
        ctx.require(op.block_signing_key)?;
        if ctx
            .db
            .find_by_key::<WitnessObject>(&op.witness_account)
            .is_some()
        {
            return Err(ValidationError::AlreadyRegistered {
                account: op.witness_account,
                role: "witness",
            }
            .into());
        }
        Ok(())
    }

    fn commit(
        op: &WitnessCreateOperation,
        _plan: (),
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        let vote_id = db.register_candidate(VoteCategory::Witness, op.witness_account)?;
        let id = db.create::<WitnessObject, _>(|id| WitnessObject {
            id,
            witness_account: op.witness_account,
            signing_key: op.block_signing_key,
            next_secret: op.initial_secret,
            last_secret: H256::ZERO,
            accumulated_income: 0,
            vote_id,
        })?;
        Ok(OperationResult::ObjectId(id.object_id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;
    use crate::evaluator::{apply_operation, validate_operation};
    use crate::objects::VoteTallyObject;
    use crate::test_utils::{genesis_db, signed_state, TestAccounts};
    use strata_crypto::{derive_private_key, PublicKey};
    use strata_primitives::{AccountId, Address, KeyId, VoteId, WitnessId, H160};
    use strata_protocol::operations::KeyData;
    use strata_protocol::{Asset, Operation};

    fn create_key(db: &mut Database, accounts: &TestAccounts, key_data: KeyData) -> KeyId {
        let op: Operation = KeyCreateOperation {
            fee: Asset::core(10),
            fee_paying_account: accounts.alice,
            key_data,
        }
        .into();
        apply_operation(db, &mut signed_state(&accounts.alice_key), &op)
            .unwrap()
            .id()
            .unwrap()
    }

    fn account_create(accounts: &TestAccounts, name: &str, key: KeyId, prime: bool) -> Operation {
        AccountCreateOperation {
            fee: Asset::core(if prime { 1_050 } else { 50 }),
            registrar: accounts.alice,
            name: name.to_string(),
            owner: Authority::single_key(key),
            active: Authority::single_key(key),
            memo_key: key,
            prime,
        }
        .into()
    }

    // ==================== Key tests ====================

    #[test]
    fn test_key_address_same_from_either_form() {
        let (mut db, accounts) = genesis_db();
        let public = PublicKey::from_private_key(&derive_private_key(b"carol").unwrap());
        let from_public = create_key(&mut db, &accounts, KeyData::PublicKey(public));
        let from_address = create_key(&mut db, &accounts, KeyData::Address(public.to_address()));

        assert_ne!(from_public, from_address);
        assert_eq!(
            db.get(from_public).unwrap().key_address(),
            db.get(from_address).unwrap().key_address()
        );
    }

    // ==================== Account tests ====================

    #[test]
    fn test_account_create_and_duplicate_name() {
        let (mut db, accounts) = genesis_db();
        let key = create_key(&mut db, &accounts, KeyData::Address(Address::from_bytes([3; 20])));
        let mut state = signed_state(&accounts.alice_key);

        let carol: AccountId = apply_operation(&mut db, &mut state, &account_create(&accounts, "carol", key, false))
            .unwrap()
            .id()
            .unwrap();
        assert_eq!(db.get(carol).unwrap().name, "carol");
        assert_eq!(db.find_by_key::<AccountObject>(&"carol".to_string()).unwrap().id, carol);

        assert_eq!(
            validate_operation(&db, &state, &account_create(&accounts, "carol", key, false)),
            Err(ChainError::Validation(ValidationError::DuplicateName("carol".to_string())))
        );
    }

    #[test]
    fn test_account_keys_must_exist() {
        let (db, accounts) = genesis_db();
        let state = signed_state(&accounts.alice_key);
        let missing = KeyId::new(500);
        assert_eq!(
            validate_operation(&db, &state, &account_create(&accounts, "carol", missing, false)),
            Err(ChainError::Validation(ValidationError::NotFound(missing.object_id())))
        );
    }

    #[test]
    fn test_prime_account_needs_prime_registrar() {
        let (mut db, accounts) = genesis_db();
        let key = create_key(&mut db, &accounts, KeyData::Address(Address::from_bytes([3; 20])));
        let state = signed_state(&accounts.alice_key);
        assert!(validate_operation(&db, &state, &account_create(&accounts, "carol", key, true)).is_ok());

        db.modify(accounts.alice, |a| a.prime = false).unwrap();
        assert_eq!(
            validate_operation(&db, &state, &account_create(&accounts, "carol", key, true)),
            Err(ChainError::Validation(ValidationError::NotPrime(accounts.alice)))
        );
    }

    // ==================== Delegate tests ====================

    fn delegate_create(account: AccountId) -> Operation {
        DelegateCreateOperation {
            fee: Asset::core(500),
            delegate_account: account,
        }
        .into()
    }

    #[test]
    fn test_delegate_requires_prime() {
        let (mut db, accounts) = genesis_db();
        let state = signed_state(&accounts.bob_key);
        assert_eq!(
            validate_operation(&db, &state, &delegate_create(accounts.bob)),
            Err(ChainError::Validation(ValidationError::NotPrime(accounts.bob)))
        );

        db.modify(accounts.bob, |a| a.prime = true).unwrap();
        assert!(validate_operation(&db, &state, &delegate_create(accounts.bob)).is_ok());
    }

    #[test]
    fn test_delegate_gets_committee_vote_id_once() {
        let (mut db, accounts) = genesis_db();
        let mut state = signed_state(&accounts.alice_key);
        let next = db.get_global_properties().unwrap().next_committee_vote_id;

        apply_operation(&mut db, &mut state, &delegate_create(accounts.alice)).unwrap();
        let delegate = db.find_by_key::<DelegateObject>(&accounts.alice).unwrap();
        assert_eq!(delegate.vote_id, VoteId::new(VoteCategory::Committee, next));
        assert!(db.find_by_key::<VoteTallyObject>(&delegate.vote_id).is_some());

        assert!(matches!(
            validate_operation(&db, &state, &delegate_create(accounts.alice)),
            Err(ChainError::Validation(ValidationError::AlreadyRegistered { role: "delegate", .. }))
        ));
    }

    // ==================== Witness tests ====================

    #[test]
    fn test_witness_create_fields() {
        let (mut db, accounts) = genesis_db();
        let key = create_key(&mut db, &accounts, KeyData::Address(Address::from_bytes([4; 20])));
        let mut state = signed_state(&accounts.bob_key);
        let secret = H160::from_bytes([5; 20]);
        let next = db.get_global_properties().unwrap().next_witness_vote_id;

        let op: Operation = WitnessCreateOperation {
            fee: Asset::core(500),
            witness_account: accounts.bob,
            block_signing_key: key,
            initial_secret: secret,
        }
        .into();
        let id: WitnessId = apply_operation(&mut db, &mut state, &op).unwrap().id().unwrap();
        let witness = db.get(id).unwrap();
        assert_eq!(witness.witness_account, accounts.bob);
        assert_eq!(witness.signing_key, key);
        assert_eq!(witness.next_secret, secret);
        assert_eq!(witness.last_secret, H256::ZERO);
        assert_eq!(witness.accumulated_income, 0);
        assert_eq!(witness.vote_id, VoteId::new(VoteCategory::Witness, next));

        let tally = db.find_by_key::<VoteTallyObject>(&witness.vote_id).unwrap();
        assert_eq!(tally.candidate, accounts.bob);
        assert!(matches!(
            validate_operation(&db, &state, &op),
            Err(ChainError::Validation(ValidationError::AlreadyRegistered { role: "witness", .. }))
        ));
    }
}
