//! Two-phase operation evaluation.
//!
//! Every operation kind has exactly one [`Evaluator`]. `validate` reads the
//! database through an [`EvalContext`], checks preconditions and stages the
//! balance movements in [`StagedDeltas`]; it never mutates. `commit` applies
//! the plan through the database's create/modify/remove primitives. The
//! generic fee and authority checks run before every `validate`.
//!
//! A failure in `validate` is an ordinary rejection. A failure after
//! validation succeeded is a [`ChainError::CommitFault`]: the state and the
//! checks disagree, and the caller's undo session must be rolled back.

mod account;
mod asset;
mod bond;
mod custom;
mod governance;
mod market;
mod staged;
mod transfer;
mod vesting;
mod worker;

pub use account::{
    AccountCreateEvaluator, DelegateCreateEvaluator, KeyCreateEvaluator, WitnessCreateEvaluator,
};
pub use asset::{AssetCreateEvaluator, AssetFundFeePoolEvaluator, AssetIssueEvaluator};
pub use bond::CreateBondOfferEvaluator;
pub use custom::CustomEvaluator;
pub use governance::GlobalParametersUpdateEvaluator;
pub use market::{
    LimitOrderCancelEvaluator, LimitOrderCreateEvaluator, ShortOrderCancelEvaluator,
    ShortOrderCreateEvaluator,
};
pub use staged::StagedDeltas;
pub use transfer::TransferEvaluator;
pub use vesting::{VestingBalanceCreateEvaluator, VestingBalanceWithdrawEvaluator};
pub use worker::WorkerCreateEvaluator;

use crate::database::Database;
use crate::error::{ChainError, ChainResult, ValidationError};
use crate::objects::{AccountObject, KeyObject};
use crate::store::ObjectRef;
use std::collections::BTreeSet;
use strata_primitives::{AccountId, Address, KeyId, ObjectId, ShareType, Timestamp, TypedId};
use strata_protocol::{codec, Asset, ChainParameters, CodecError, Operation, OperationBody};
use tracing::{debug, error};

/// Validate/commit pair for one operation kind
pub trait Evaluator {
    /// The operation this evaluator handles
    type Operation: OperationBody;

    /// What validation hands to commit
    type Plan;

    /// Check preconditions and stage movements; never mutates
    fn validate(
        op: &Self::Operation,
        ctx: &EvalContext<'_>,
        staged: &mut StagedDeltas,
    ) -> ChainResult<Self::Plan>;

    /// Apply a validated operation
    fn commit(
        op: &Self::Operation,
        plan: Self::Plan,
        db: &mut Database,
        state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult>;
}

/// Per-transaction evaluation state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionEvalState {
    /// The transaction was approved by the committee
    pub is_proposed_trx: bool,
    /// Signatures have been checked elsewhere
    pub skip_authority_check: bool,
    /// Addresses recovered from the transaction's signatures
    pub signers: BTreeSet<Address>,
    /// Result of each operation evaluated so far
    pub operation_results: Vec<OperationResult>,
}

impl TransactionEvalState {
    /// State for a transaction signed by `signers`
    pub fn signed_by(signers: BTreeSet<Address>) -> Self {
        Self {
            signers,
            ..Default::default()
        }
    }

    /// State for a committee-approved transaction
    pub fn proposed() -> Self {
        Self {
            is_proposed_trx: true,
            skip_authority_check: true,
            ..Default::default()
        }
    }
}

/// What an operation produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationResult {
    /// Nothing
    None,
    /// Id of a created object
    ObjectId(ObjectId),
    /// An amount paid out
    Asset(Asset),
}

impl OperationResult {
    /// The created id, typed
    pub fn id<I: TypedId>(&self) -> Option<I> {
        match self {
            OperationResult::ObjectId(id) if id.is::<I>() => Some(I::from_instance(id.instance)),
            _ => None,
        }
    }
}

/// Read-only view handed to `validate`
pub struct EvalContext<'a> {
    /// The database
    pub db: &'a Database,
    /// The transaction being evaluated
    pub state: &'a TransactionEvalState,
}

impl<'a> EvalContext<'a> {
    /// Context over `db`
    pub fn new(db: &'a Database, state: &'a TransactionEvalState) -> Self {
        Self { db, state }
    }

    /// Look up an object the operation depends on
    pub fn require<I: ObjectRef>(&self, id: I) -> ChainResult<&'a I::Object> {
        self.db
            .find(id)
            .ok_or_else(|| ValidationError::NotFound(id.object_id()).into())
    }

    /// Head block time
    pub fn now(&self) -> ChainResult<Timestamp> {
        self.db.head_block_time()
    }

    /// Active chain parameters
    pub fn parameters(&self) -> ChainResult<&'a ChainParameters> {
        Ok(&self.db.get_global_properties()?.parameters)
    }

    fn check_authority(&self, account: AccountId) -> ChainResult<()> {
        let object: &AccountObject = self.require(account)?;
        let resolve = |key: KeyId| self.db.find(key).map(KeyObject::key_address);
        if object.active.is_satisfied_by(&self.state.signers, resolve)
            || object.owner.is_satisfied_by(&self.state.signers, resolve)
        {
            return Ok(());
        }
        Err(ValidationError::MissingAuthority(account).into())
    }

    /// Stage payment of the declared fee, which must cover `required` core.
    ///
    /// A fee in another asset is valued through that asset's core exchange
    /// rate; its fee pool pays the core equivalent into the treasury and
    /// keeps the paid asset as accumulated fees.
    fn stage_fee(
        &self,
        payer: AccountId,
        fee: Asset,
        required: ShareType,
        staged: &mut StagedDeltas,
    ) -> ChainResult<()> {
        let core_paid = if fee.is_core() {
            fee.amount
        } else {
            let asset = self.require(fee.asset_id)?;
            let core = asset.options.core_exchange_rate.convert(&fee)?;
            if !core.is_core() {
                return Err(ValidationError::InvalidAsset {
                    asset: fee.asset_id,
                    reason: "exchange rate not quoted against core",
                }
                .into());
            }
            core.amount
        };
        if core_paid < required {
            return Err(ValidationError::InsufficientFee {
                required,
                paid: core_paid,
            }
            .into());
        }
        if fee.amount == 0 {
            return Ok(());
        }
        staged.adjust_balance(payer, Asset::new(-fee.amount, fee.asset_id))?;
        if !fee.is_core() {
            staged.adjust_accumulated_fees(fee.asset_id, fee.amount)?;
            staged.adjust_fee_pool(fee.asset_id, -core_paid)?;
        }
        staged.adjust_treasury(core_paid)
    }
}

/// Run the generic checks and `E::validate`, returning the plan and the
/// movements it staged
pub fn prepare<E: Evaluator>(
    db: &Database,
    state: &TransactionEvalState,
    op: &E::Operation,
    required_fee: ShareType,
) -> ChainResult<(E::Plan, StagedDeltas)> {
    let ctx = EvalContext::new(db, state);
    if !state.skip_authority_check {
        let mut accounts = BTreeSet::new();
        op.required_active_authorities(&mut accounts);
        for account in accounts {
            ctx.check_authority(account)?;
        }
    }

    let mut staged = StagedDeltas::new();
    ctx.stage_fee(op.fee_payer(), op.fee(), required_fee, &mut staged)?;
    let plan = E::validate(op, &ctx, &mut staged)?;
    staged.check(db)?;
    Ok((plan, staged))
}

/// Validate then commit one operation
pub fn evaluate<E: Evaluator>(
    db: &mut Database,
    state: &mut TransactionEvalState,
    op: &E::Operation,
    required_fee: ShareType,
) -> ChainResult<OperationResult> {
    let (plan, staged) = prepare::<E>(db, state, op, required_fee)?;
    debug!(operation = op.name(), "validated");

    let result = staged
        .apply(db)
        .and_then(|()| E::commit(op, plan, db, state))
        .map_err(|e| commit_fault(op.name(), e))?;
    state.operation_results.push(result.clone());
    Ok(result)
}

fn commit_fault(operation: &'static str, cause: ChainError) -> ChainError {
    error!(operation, error = %cause, "commit failed after successful validation");
    ChainError::CommitFault {
        operation,
        reason: cause.to_string(),
    }
}

macro_rules! dispatch {
    ($operation:expr, |$evaluator:ident, $op:ident| $body:expr) => {
        match $operation {
            Operation::Transfer($op) => {
                type $evaluator = TransferEvaluator;
                $body
            }
            Operation::LimitOrderCreate($op) => {
                type $evaluator = LimitOrderCreateEvaluator;
                $body
            }
            Operation::LimitOrderCancel($op) => {
                type $evaluator = LimitOrderCancelEvaluator;
                $body
            }
            Operation::ShortOrderCreate($op) => {
                type $evaluator = ShortOrderCreateEvaluator;
                $body
            }
            Operation::ShortOrderCancel($op) => {
                type $evaluator = ShortOrderCancelEvaluator;
                $body
            }
            Operation::KeyCreate($op) => {
                type $evaluator = KeyCreateEvaluator;
                $body
            }
            Operation::AccountCreate($op) => {
                type $evaluator = AccountCreateEvaluator;
                $body
            }
            Operation::DelegateCreate($op) => {
                type $evaluator = DelegateCreateEvaluator;
                $body
            }
            Operation::WitnessCreate($op) => {
                type $evaluator = WitnessCreateEvaluator;
                $body
            }
            Operation::AssetCreate($op) => {
                type $evaluator = AssetCreateEvaluator;
                $body
            }
            Operation::AssetIssue($op) => {
                type $evaluator = AssetIssueEvaluator;
                $body
            }
            Operation::AssetFundFeePool($op) => {
                type $evaluator = AssetFundFeePoolEvaluator;
                $body
            }
            Operation::GlobalParametersUpdate($op) => {
                type $evaluator = GlobalParametersUpdateEvaluator;
                $body
            }
            Operation::CreateBondOffer($op) => {
                type $evaluator = CreateBondOfferEvaluator;
                $body
            }
            Operation::VestingBalanceCreate($op) => {
                type $evaluator = VestingBalanceCreateEvaluator;
                $body
            }
            Operation::VestingBalanceWithdraw($op) => {
                type $evaluator = VestingBalanceWithdrawEvaluator;
                $body
            }
            Operation::WorkerCreate($op) => {
                type $evaluator = WorkerCreateEvaluator;
                $body
            }
            Operation::Custom($op) => {
                type $evaluator = CustomEvaluator;
                $body
            }
        }
    };
}

/// Evaluate any operation with the evaluator bound to its kind
pub fn apply_operation(
    db: &mut Database,
    state: &mut TransactionEvalState,
    operation: &Operation,
) -> ChainResult<OperationResult> {
    operation.validate()?;
    let required_fee = db.current_fee_schedule()?.calculate_fee(operation);
    dispatch!(operation, |E, op| evaluate::<E>(db, state, op, required_fee))
}

/// Dry run: every check `apply_operation` performs, without mutating
pub fn validate_operation(
    db: &Database,
    state: &TransactionEvalState,
    operation: &Operation,
) -> ChainResult<()> {
    operation.validate()?;
    let required_fee = db.current_fee_schedule()?.calculate_fee(operation);
    dispatch!(operation, |E, op| prepare::<E>(db, state, op, required_fee).map(|_| ()))
}

/// Decode an operation received from the wire
pub fn operation_from_wire(bytes: &[u8]) -> ChainResult<Operation> {
    codec::decode_operation(bytes).map_err(|e| match e {
        CodecError::UnknownOperationTag(tag) => ChainError::UnknownOperation(tag),
        other => other.into(),
    })
}
