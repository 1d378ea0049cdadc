//! Order placement and cancellation.
//!
//! Placing an order escrows the seller's funds in the order object; the
//! market fee owed on the receiving side is computed up front and carried
//! on the order. Cancelling refunds the escrow and removes the order.

use super::{EvalContext, Evaluator, OperationResult, StagedDeltas, TransactionEvalState};
use crate::database::Database;
use crate::error::{ChainResult, ValidationError};
use crate::objects::{LimitOrderObject, ShortOrderObject};
use strata_primitives::{AccountId, ObjectId, ShareType, Timestamp, TypedId};
use strata_protocol::operations::{
    LimitOrderCancelOperation, LimitOrderCreateOperation, ShortOrderCancelOperation,
    ShortOrderCreateOperation,
};
use strata_protocol::{Asset, Price};

fn check_not_expired(ctx: &EvalContext<'_>, expiration: Timestamp) -> ChainResult<()> {
    let now = ctx.now()?;
    if expiration <= now {
        return Err(ValidationError::Expired { expiration, now }.into());
    }
    Ok(())
}

fn check_seller(object: ObjectId, seller: AccountId, caller: AccountId) -> ChainResult<()> {
    if seller != caller {
        return Err(ValidationError::NotOwner {
            object,
            account: caller,
        }
        .into());
    }
    Ok(())
}

/// Places a limit order
pub struct LimitOrderCreateEvaluator;

impl Evaluator for LimitOrderCreateEvaluator {
    type Operation = LimitOrderCreateOperation;
    /// Deferred market fee
    type Plan = ShareType;

    fn validate(
        op: &LimitOrderCreateOperation,
        ctx: &EvalContext<'_>,
        staged: &mut StagedDeltas,
    ) -> ChainResult<ShareType> {
        ctx.require(op.seller)?;
        ctx.require(op.amount_to_sell.asset_id)?;
        let receive = ctx.require(op.min_to_receive.asset_id)?;
        check_not_expired(ctx, op.expiration)?;

        staged.adjust_balance(
            op.seller,
            Asset::new(-op.amount_to_sell.amount, op.amount_to_sell.asset_id),
        )?;
        Ok(receive.market_fee(op.min_to_receive.amount))
    }

    fn commit(
        op: &LimitOrderCreateOperation,
        deferred_market_fee: ShareType,
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        let id = db.create::<LimitOrderObject, _>(|id| LimitOrderObject {
            id,
            seller: op.seller,
            for_sale: op.amount_to_sell.amount,
            sell_price: Price::new(op.amount_to_sell, op.min_to_receive),
            expiration: op.expiration,
            deferred_market_fee,
        })?;
        Ok(OperationResult::ObjectId(id.object_id()))
    }
}

/// Cancels a limit order, refunding what remains for sale
pub struct LimitOrderCancelEvaluator;

impl Evaluator for LimitOrderCancelEvaluator {
    type Operation = LimitOrderCancelOperation;
    type Plan = Asset;

    fn validate(
        op: &LimitOrderCancelOperation,
        ctx: &EvalContext<'_>,
        staged: &mut StagedDeltas,
    ) -> ChainResult<Asset> {
        let order = ctx.require(op.order)?;
        check_seller(op.order.object_id(), order.seller, op.fee_paying_account)?;
        let refund = order.amount_for_sale();
        staged.adjust_balance(order.seller, refund)?;
        Ok(refund)
    }

    fn commit(
        op: &LimitOrderCancelOperation,
        refund: Asset,
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        db.remove(op.order)?;
        Ok(OperationResult::Asset(refund))
    }
}

/// Places a short order, escrowing collateral in the backing asset
pub struct ShortOrderCreateEvaluator;

impl Evaluator for ShortOrderCreateEvaluator {
    type Operation = ShortOrderCreateOperation;
    /// Deferred market fee
    type Plan = ShareType;

    fn validate(
        op: &ShortOrderCreateOperation,
        ctx: &EvalContext<'_>,
        staged: &mut StagedDeltas,
    ) -> ChainResult<ShareType> {
        ctx.require(op.seller)?;
        let shorted = ctx.require(op.amount_to_sell.asset_id)?;
        let backing = shorted.short_backing_asset.ok_or(ValidationError::InvalidAsset {
            asset: shorted.id,
            reason: "not market-issued",
        })?;
        if op.collateral.asset_id != backing {
            return Err(ValidationError::InvalidAsset {
                asset: op.collateral.asset_id,
                reason: "collateral is not the backing asset",
            }
            .into());
        }
        let backing = ctx.require(backing)?;
        check_not_expired(ctx, op.expiration)?;

        staged.adjust_balance(
            op.seller,
            Asset::new(-op.collateral.amount, op.collateral.asset_id),
        )?;
        Ok(backing.market_fee(op.collateral.amount))
    }

    fn commit(
        op: &ShortOrderCreateOperation,
        deferred_market_fee: ShareType,
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        let id = db.create::<ShortOrderObject, _>(|id| ShortOrderObject {
            id,
            seller: op.seller,
            amount_to_sell: op.amount_to_sell,
            collateral: op.collateral,
            initial_collateral_ratio: op.initial_collateral_ratio,
            maintenance_collateral_ratio: op.maintenance_collateral_ratio,
            expiration: op.expiration,
            deferred_market_fee,
        })?;
        Ok(OperationResult::ObjectId(id.object_id()))
    }
}

/// Cancels a short order, refunding its collateral
pub struct ShortOrderCancelEvaluator;

impl Evaluator for ShortOrderCancelEvaluator {
    type Operation = ShortOrderCancelOperation;
    type Plan = Asset;

    fn validate(
        op: &ShortOrderCancelOperation,
        ctx: &EvalContext<'_>,
        staged: &mut StagedDeltas,
    ) -> ChainResult<Asset> {
        let order = ctx.require(op.order)?;
        check_seller(op.order.object_id(), order.seller, op.fee_paying_account)?;
        staged.adjust_balance(order.seller, order.collateral)?;
        Ok(order.collateral)
    }

    fn commit(
        op: &ShortOrderCancelOperation,
        refund: Asset,
        db: &mut Database,
        _state: &mut TransactionEvalState,
    ) -> ChainResult<OperationResult> {
        db.remove(op.order)?;
        Ok(OperationResult::Asset(refund))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;
    use crate::evaluator::{apply_operation, validate_operation};
    use crate::test_utils::{create_asset, genesis_db, signed_state, TestAccounts};
    use strata_primitives::{AssetId, LimitOrderId, ShortOrderId};
    use strata_protocol::Operation;

    fn limit_order(accounts: &TestAccounts, sell: i64, expiration: Timestamp) -> Operation {
        LimitOrderCreateOperation {
            fee: Asset::core(5),
            seller: accounts.alice,
            amount_to_sell: Asset::core(sell),
            min_to_receive: Asset::new(10, AssetId::new(1)),
            expiration,
        }
        .into()
    }

    // ==================== Limit order tests ====================

    #[test]
    fn test_limit_order_escrows_and_cancel_refunds() {
        let (mut db, accounts) = genesis_db();
        create_asset(&mut db, &accounts, "GOLD", None);
        let now = db.head_block_time().unwrap();
        let start = db.get_balance(accounts.alice, AssetId::CORE);
        let mut state = signed_state(&accounts.alice_key);

        let result = apply_operation(&mut db, &mut state, &limit_order(&accounts, 300, now + 60)).unwrap();
        let order: LimitOrderId = result.id().unwrap();
        assert_eq!(db.get(order).unwrap().amount_for_sale(), Asset::core(300));
        assert_eq!(db.get_balance(accounts.alice, AssetId::CORE), start - 305);
        assert!(db.audit_supply(AssetId::CORE).unwrap().is_consistent());

        let cancel: Operation = LimitOrderCancelOperation {
            fee: Asset::core(0),
            fee_paying_account: accounts.alice,
            order,
        }
        .into();
        let refund = apply_operation(&mut db, &mut state, &cancel).unwrap();
        assert_eq!(refund, OperationResult::Asset(Asset::core(300)));
        assert!(db.find(order).is_none());
        assert_eq!(db.get_balance(accounts.alice, AssetId::CORE), start - 5);
    }

    #[test]
    fn test_limit_order_expired_or_unknown_asset() {
        let (mut db, accounts) = genesis_db();
        let state = signed_state(&accounts.alice_key);
        let now = db.head_block_time().unwrap();
        assert!(matches!(
            validate_operation(&db, &state, &limit_order(&accounts, 10, now + 60)),
            Err(ChainError::Validation(ValidationError::NotFound(_)))
        ));

        create_asset(&mut db, &accounts, "GOLD", None);
        assert_eq!(
            validate_operation(&db, &state, &limit_order(&accounts, 10, now)),
            Err(ChainError::Validation(ValidationError::Expired {
                expiration: now,
                now
            }))
        );
    }

    #[test]
    fn test_market_fee_deferred_from_receiving_asset() {
        let (mut db, accounts) = genesis_db();
        let gold = create_asset(&mut db, &accounts, "GOLD", None);
        db.modify(gold, |a| a.options.market_fee_percent = 100).unwrap();
        let now = db.head_block_time().unwrap();
        let mut state = signed_state(&accounts.alice_key);

        let op: Operation = LimitOrderCreateOperation {
            fee: Asset::core(5),
            seller: accounts.alice,
            amount_to_sell: Asset::core(50),
            min_to_receive: Asset::new(1_000, gold),
            expiration: now + 60,
        }
        .into();
        let order: LimitOrderId = apply_operation(&mut db, &mut state, &op).unwrap().id().unwrap();
        assert_eq!(db.get(order).unwrap().deferred_market_fee, 10);
    }

    #[test]
    fn test_only_seller_cancels() {
        let (mut db, accounts) = genesis_db();
        create_asset(&mut db, &accounts, "GOLD", None);
        let now = db.head_block_time().unwrap();
        let mut state = signed_state(&accounts.alice_key);
        let order: LimitOrderId = apply_operation(&mut db, &mut state, &limit_order(&accounts, 10, now + 60))
            .unwrap()
            .id()
            .unwrap();

        let cancel: Operation = LimitOrderCancelOperation {
            fee: Asset::core(0),
            fee_paying_account: accounts.bob,
            order,
        }
        .into();
        assert_eq!(
            validate_operation(&db, &signed_state(&accounts.bob_key), &cancel),
            Err(ChainError::Validation(ValidationError::NotOwner {
                object: order.object_id(),
                account: accounts.bob,
            }))
        );
    }

    // ==================== Short order tests ====================

    fn short_order(accounts: &TestAccounts, shorted: AssetId, collateral: Asset, expiration: Timestamp) -> Operation {
        ShortOrderCreateOperation {
            fee: Asset::core(5),
            seller: accounts.alice,
            amount_to_sell: Asset::new(100, shorted),
            collateral,
            initial_collateral_ratio: 2_000,
            maintenance_collateral_ratio: 1_750,
            expiration,
        }
        .into()
    }

    #[test]
    fn test_short_order_requires_market_issued_asset() {
        let (mut db, accounts) = genesis_db();
        let user_issued = create_asset(&mut db, &accounts, "GOLD", None);
        let now = db.head_block_time().unwrap();
        let state = signed_state(&accounts.alice_key);
        assert!(matches!(
            validate_operation(&db, &state, &short_order(&accounts, user_issued, Asset::core(200), now + 60)),
            Err(ChainError::Validation(ValidationError::InvalidAsset { reason: "not market-issued", .. }))
        ));
    }

    #[test]
    fn test_short_order_escrows_backing_collateral() {
        let (mut db, accounts) = genesis_db();
        let usd = create_asset(&mut db, &accounts, "USD", Some(AssetId::CORE));
        let gold = create_asset(&mut db, &accounts, "GOLD", None);
        let now = db.head_block_time().unwrap();
        let start = db.get_balance(accounts.alice, AssetId::CORE);
        let mut state = signed_state(&accounts.alice_key);

        assert!(matches!(
            validate_operation(&db, &state, &short_order(&accounts, usd, Asset::new(200, gold), now + 60)),
            Err(ChainError::Validation(ValidationError::InvalidAsset { .. }))
        ));

        let order: ShortOrderId = apply_operation(
            &mut db,
            &mut state,
            &short_order(&accounts, usd, Asset::core(200), now + 60),
        )
        .unwrap()
        .id()
        .unwrap();
        assert_eq!(db.get_balance(accounts.alice, AssetId::CORE), start - 205);
        assert!(db.audit_supply(AssetId::CORE).unwrap().is_consistent());

        let cancel: Operation = ShortOrderCancelOperation {
            fee: Asset::core(0),
            fee_paying_account: accounts.alice,
            order,
        }
        .into();
        apply_operation(&mut db, &mut state, &cancel).unwrap();
        assert_eq!(db.get_balance(accounts.alice, AssetId::CORE), start - 5);
        assert!(db.find(order).is_none());
    }
}
