//! End-to-end scenarios for the Strata ledger
//!
//! Each scenario drives a fresh chain through transactions and blocks the
//! way a node would, checking balances, supply and chain state along the way.

#[cfg(test)]
mod tests {
    use crate::builder::{account_key, TrxBuilder};
    use crate::harness::{TestHarness, FUNDED_BALANCE, GENESIS_TIME};
    use crate::E2EError;
    use bytes::Bytes;
    use strata_chain::objects::{WorkerObject, WorkerPayPolicy};
    use strata_chain::{ChainError, ValidationError};
    use strata_crypto::PublicKey;
    use strata_primitives::{AccountId, AssetId, KeyId, ShareType, Timestamp, VestingBalanceId};
    use strata_protocol::operations::{
        AccountCreateOperation, AssetCreateOperation, AssetIssueOperation, AssetOptions,
        GlobalParametersUpdateOperation, KeyCreateOperation, KeyData, LimitOrderCreateOperation,
        TransferOperation, VestingBalanceCreateOperation, VestingBalanceWithdrawOperation,
        VestingPolicyInitializer, WorkerCreateOperation, WorkerInitializer,
    };
    use strata_protocol::{
        Asset, Authority, BlockMessage, CodecError, Envelope, Price, TransactionMessage,
        COMMITTEE_ACCOUNT,
    };

    // ============================================================================
    // Operation Helpers
    // ============================================================================

    /// Log to the test output, filtered by `RUST_LOG`
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }

    fn transfer(from: AccountId, to: AccountId, amount: ShareType) -> TransferOperation {
        TransferOperation {
            fee: Asset::core(0),
            from,
            to,
            amount: Asset::core(amount),
            memo: Bytes::new(),
        }
    }

    fn asset_create(issuer: AccountId, symbol: &str) -> AssetCreateOperation {
        AssetCreateOperation {
            fee: Asset::core(0),
            issuer,
            symbol: symbol.to_string(),
            precision: 4,
            common_options: AssetOptions {
                max_supply: 1_000_000,
                market_fee_percent: 0,
                core_exchange_rate: Price::new(Asset::new(1, AssetId::new(1)), Asset::core(1)),
            },
            short_backing_asset: None,
        }
    }

    fn worker(
        owner: AccountId,
        begin: Timestamp,
        daily_pay: ShareType,
        initializer: WorkerInitializer,
    ) -> WorkerCreateOperation {
        WorkerCreateOperation {
            fee: Asset::core(0),
            owner,
            work_begin_date: begin,
            work_end_date: begin + 30 * 86_400,
            daily_pay,
            name: "indexer".to_string(),
            url: "https://example.org/indexer".to_string(),
            initializer,
        }
    }

    fn is_validation(err: &E2EError, pred: impl Fn(&ValidationError) -> bool) -> bool {
        matches!(err, E2EError::Chain(ChainError::Validation(e)) if pred(e))
    }

    fn core_supply(harness: &TestHarness) -> ShareType {
        let db = harness.db();
        let asset = db.get(AssetId::CORE).unwrap();
        db.get(asset.dynamic_data).unwrap().current_supply
    }

    fn treasury(harness: &TestHarness) -> ShareType {
        harness
            .db()
            .get_dynamic_global_properties()
            .unwrap()
            .treasury
    }

    fn only_worker(harness: &TestHarness) -> WorkerObject {
        harness
            .db()
            .index::<WorkerObject>()
            .iter()
            .next()
            .cloned()
            .unwrap()
    }

    // ============================================================================
    // Transfer Tests
    // ============================================================================

    #[test]
    fn test_transfer_in_block() {
        let mut h = TestHarness::new().unwrap();
        let (alice, bob) = (h.id("alice").unwrap(), h.id("bob").unwrap());
        let fee = 20;

        h.submit(TrxBuilder::single(transfer(alice, bob, 12_345)), &["alice"])
            .unwrap();
        // Pending state already shows the transfer
        assert_eq!(h.core_balance("bob").unwrap(), FUNDED_BALANCE + 12_345);

        let block = h.produce_block().unwrap();
        assert_eq!(block.transactions.len(), 1);
        assert!(h.db().pending_transactions().is_empty());
        assert_eq!(h.core_balance("bob").unwrap(), FUNDED_BALANCE + 12_345);
        assert_eq!(
            h.core_balance("alice").unwrap(),
            FUNDED_BALANCE - 12_345 - fee
        );
        h.assert_supply_consistent(AssetId::CORE).unwrap();
    }

    #[test]
    fn test_transfer_signed_by_wrong_account() {
        let mut h = TestHarness::new().unwrap();
        let (alice, bob) = (h.id("alice").unwrap(), h.id("bob").unwrap());

        let err = h
            .submit(TrxBuilder::single(transfer(alice, bob, 1)), &["bob"])
            .unwrap_err();
        assert!(is_validation(&err, |e| matches!(e, ValidationError::MissingAuthority(id) if *id == alice)));
        assert_eq!(h.core_balance("alice").unwrap(), FUNDED_BALANCE);
    }

    #[test]
    fn test_failed_operation_reverts_whole_transaction() {
        let mut h = TestHarness::new().unwrap();
        let (alice, bob) = (h.id("alice").unwrap(), h.id("bob").unwrap());

        let trx = TrxBuilder::new()
            .op(transfer(alice, bob, 1_000))
            .op(transfer(alice, bob, FUNDED_BALANCE * 2));
        let err = h.submit(trx, &["alice"]).unwrap_err();
        assert!(is_validation(&err, |e| matches!(e, ValidationError::InsufficientBalance { .. })));
        assert_eq!(h.core_balance("bob").unwrap(), FUNDED_BALANCE);
        assert!(h.db().pending_transactions().is_empty());
    }

    #[test]
    fn test_duplicate_transaction_rejected() {
        let mut h = TestHarness::new().unwrap();
        let (alice, bob) = (h.id("alice").unwrap(), h.id("bob").unwrap());
        let trx = h
            .sign(TrxBuilder::single(transfer(alice, bob, 10)), &["alice"])
            .unwrap();

        h.push(trx.clone()).unwrap();
        assert!(matches!(
            h.push(trx.clone()),
            Err(E2EError::Chain(ChainError::InvalidTransaction(_)))
        ));

        // Still a duplicate once it is in a block
        h.produce_block().unwrap();
        assert!(h.push(trx).is_err());
        assert_eq!(h.core_balance("bob").unwrap(), FUNDED_BALANCE + 10);
    }

    #[test]
    fn test_expired_transaction_rejected() {
        let mut h = TestHarness::new().unwrap();
        let (alice, bob) = (h.id("alice").unwrap(), h.id("bob").unwrap());

        let trx = TrxBuilder::single(transfer(alice, bob, 10)).expires_at(GENESIS_TIME);
        let err = h.submit(trx, &["alice"]).unwrap_err();
        assert!(is_validation(&err, |e| matches!(e, ValidationError::Expired { .. })));
    }

    // ============================================================================
    // Account Tests
    // ============================================================================

    #[test]
    fn test_register_account_and_spend_from_it() {
        let mut h = TestHarness::new().unwrap();
        let alice = h.id("alice").unwrap();
        let dave_key = account_key("dave").unwrap();

        let state = h
            .submit(
                TrxBuilder::single(KeyCreateOperation {
                    fee: Asset::core(0),
                    fee_paying_account: alice,
                    key_data: KeyData::PublicKey(PublicKey::from_private_key(&dave_key)),
                }),
                &["alice"],
            )
            .unwrap();
        let key: KeyId = state.operation_results[0].id().unwrap();

        h.submit(
            TrxBuilder::single(AccountCreateOperation {
                fee: Asset::core(0),
                registrar: alice,
                name: "dave".to_string(),
                owner: Authority::single_key(key),
                active: Authority::single_key(key),
                memo_key: key,
                prime: false,
            }),
            &["alice"],
        )
        .unwrap();
        h.produce_block().unwrap();
        let dave = h.track_account("dave", dave_key).unwrap();

        h.submit(TrxBuilder::single(transfer(alice, dave, 5_000)), &["alice"])
            .unwrap();
        let bob = h.id("bob").unwrap();
        h.submit(TrxBuilder::single(transfer(dave, bob, 1_000)), &["dave"])
            .unwrap();
        h.produce_block().unwrap();

        assert_eq!(h.core_balance("dave").unwrap(), 5_000 - 1_000 - 20);
        h.assert_supply_consistent(AssetId::CORE).unwrap();
    }

    #[test]
    fn test_account_name_taken() {
        let mut h = TestHarness::new().unwrap();
        let alice = h.id("alice").unwrap();
        let err = h
            .submit(
                TrxBuilder::single(AccountCreateOperation {
                    fee: Asset::core(0),
                    registrar: alice,
                    name: "bob".to_string(),
                    owner: Authority::single_key(KeyId::new(0)),
                    active: Authority::single_key(KeyId::new(0)),
                    memo_key: KeyId::new(0),
                    prime: false,
                }),
                &["alice"],
            )
            .unwrap_err();
        assert!(is_validation(&err, |e| matches!(e, ValidationError::DuplicateName(name) if name == "bob")));
    }

    // ============================================================================
    // Asset Tests
    // ============================================================================

    #[test]
    fn test_duplicate_symbol_rejected() {
        let mut h = TestHarness::new().unwrap();
        let (alice, bob) = (h.id("alice").unwrap(), h.id("bob").unwrap());

        h.submit(TrxBuilder::single(asset_create(alice, "TEST")), &["alice"])
            .unwrap();
        let err = h
            .submit(TrxBuilder::single(asset_create(bob, "TEST")), &["bob"])
            .unwrap_err();
        assert!(is_validation(&err, |e| matches!(e, ValidationError::DuplicateSymbol(s) if s == "TEST")));

        h.produce_block().unwrap();
        assert!(h
            .submit(TrxBuilder::single(asset_create(bob, "TEST")), &["bob"])
            .is_err());
        // Bob paid nothing for the rejected attempts
        assert_eq!(h.core_balance("bob").unwrap(), FUNDED_BALANCE);
    }

    #[test]
    fn test_issue_user_asset() {
        let mut h = TestHarness::new().unwrap();
        let (alice, bob) = (h.id("alice").unwrap(), h.id("bob").unwrap());

        let state = h
            .submit(TrxBuilder::single(asset_create(alice, "GOLD")), &["alice"])
            .unwrap();
        let gold: AssetId = state.operation_results[0].id().unwrap();
        let issue = |amount| AssetIssueOperation {
            fee: Asset::core(0),
            issuer: alice,
            asset_to_issue: Asset::new(amount, gold),
            issue_to_account: bob,
        };

        h.submit(TrxBuilder::single(issue(400_000)), &["alice"])
            .unwrap();
        h.produce_block().unwrap();
        assert_eq!(h.balance("bob", gold).unwrap(), 400_000);
        h.assert_supply_consistent(gold).unwrap();

        // Past max supply
        let err = h
            .submit(TrxBuilder::single(issue(600_001)), &["alice"])
            .unwrap_err();
        assert!(is_validation(&err, |e| matches!(e, ValidationError::SupplyExceeded { .. })));

        // Only the issuer may issue
        let stolen = AssetIssueOperation {
            issuer: bob,
            ..issue(1)
        };
        assert!(h.submit(TrxBuilder::single(stolen), &["bob"]).is_err());
    }

    // ============================================================================
    // Market Tests
    // ============================================================================

    #[test]
    fn test_expired_limit_order_refunded() {
        let mut h = TestHarness::new().unwrap();
        let alice = h.id("alice").unwrap();

        let state = h
            .submit(TrxBuilder::single(asset_create(alice, "GOLD")), &["alice"])
            .unwrap();
        let gold: AssetId = state.operation_results[0].id().unwrap();
        h.produce_block().unwrap();
        let before = h.core_balance("alice").unwrap();

        let expiration = h.now().unwrap() + 20;
        h.submit(
            TrxBuilder::single(LimitOrderCreateOperation {
                fee: Asset::core(0),
                seller: alice,
                amount_to_sell: Asset::core(1_000),
                min_to_receive: Asset::new(10, gold),
                expiration,
            }),
            &["alice"],
        )
        .unwrap();
        h.produce_block().unwrap();
        let order_fee = 5;
        assert_eq!(h.core_balance("alice").unwrap(), before - 1_000 - order_fee);
        h.assert_supply_consistent(AssetId::CORE).unwrap();

        h.produce_block_at(expiration).unwrap();
        assert_eq!(h.core_balance("alice").unwrap(), before - order_fee);
        h.assert_supply_consistent(AssetId::CORE).unwrap();
    }

    // ============================================================================
    // Vesting Tests
    // ============================================================================

    #[test]
    fn test_linear_vesting_releases_over_time() {
        let mut h = TestHarness::new().unwrap();
        let (alice, bob) = (h.id("alice").unwrap(), h.id("bob").unwrap());

        let state = h
            .submit(
                TrxBuilder::single(VestingBalanceCreateOperation {
                    fee: Asset::core(0),
                    creator: alice,
                    owner: bob,
                    amount: Asset::core(1_000),
                    policy: VestingPolicyInitializer::Linear {
                        begin_timestamp: GENESIS_TIME,
                        vesting_cliff_seconds: 0,
                        vesting_duration_seconds: 100,
                    },
                }),
                &["alice"],
            )
            .unwrap();
        let balance: VestingBalanceId = state.operation_results[0].id().unwrap();
        h.produce_block().unwrap();
        h.produce_block_at(GENESIS_TIME + 50).unwrap();

        let withdraw = |amount| VestingBalanceWithdrawOperation {
            fee: Asset::core(0),
            vesting_balance: balance,
            owner: bob,
            amount: Asset::core(amount),
        };
        // Alice cannot take bob's funds
        let by_alice = VestingBalanceWithdrawOperation {
            owner: alice,
            ..withdraw(1)
        };
        let err = h.submit(TrxBuilder::single(by_alice), &["alice"]).unwrap_err();
        assert!(is_validation(&err, |e| matches!(e, ValidationError::NotOwner { .. })));

        h.submit(TrxBuilder::single(withdraw(500)), &["bob"]).unwrap();
        let err = h
            .submit(TrxBuilder::single(withdraw(1)), &["bob"])
            .unwrap_err();
        assert!(is_validation(&err, |e| matches!(e, ValidationError::VestingLimit { .. })));

        h.produce_block().unwrap();
        assert_eq!(h.core_balance("bob").unwrap(), FUNDED_BALANCE + 500 - 20);
        h.assert_supply_consistent(AssetId::CORE).unwrap();
    }

    // ============================================================================
    // Worker Tests
    // ============================================================================

    #[test]
    fn test_refund_worker_burns_pay_at_maintenance() {
        let mut h = TestHarness::new().unwrap();
        let alice = h.id("alice").unwrap();
        let begin = h.now().unwrap();

        h.submit(
            TrxBuilder::single(worker(alice, begin, 1_000, WorkerInitializer::Refund)),
            &["alice"],
        )
        .unwrap();
        h.produce_block().unwrap();
        let (supply, reserve) = (core_supply(&h), treasury(&h));

        h.produce_maintenance_block().unwrap();
        let witness_pay = 10;
        assert_eq!(core_supply(&h), supply - 1_000);
        assert_eq!(treasury(&h), reserve - 1_000 - witness_pay);
        assert!(matches!(
            only_worker(&h).pay_policy,
            WorkerPayPolicy::Refund { total_burned: 1_000 }
        ));
        h.assert_supply_consistent(AssetId::CORE).unwrap();
    }

    #[test]
    fn test_vesting_worker_pay_withdrawable_after_a_day() {
        init_tracing();
        let mut h = TestHarness::new().unwrap();
        let alice = h.id("alice").unwrap();
        let begin = h.now().unwrap();

        h.submit(
            TrxBuilder::single(worker(
                alice,
                begin,
                2_000,
                WorkerInitializer::Vesting {
                    pay_vesting_period_days: 1,
                },
            )),
            &["alice"],
        )
        .unwrap();
        h.produce_block().unwrap();
        let WorkerPayPolicy::Vesting { balance } = only_worker(&h).pay_policy else {
            panic!("expected a vesting worker");
        };

        // First pay has not aged yet
        h.produce_maintenance_block().unwrap();
        let now = h.now().unwrap();
        let vesting = h.db().get(balance).unwrap();
        assert_eq!(vesting.balance.amount, 2_000);
        assert_eq!(vesting.allowed_withdraw(now), 0);

        // A day later the first pay has vested; the second has not
        h.produce_maintenance_block().unwrap();
        let now = h.now().unwrap();
        let vesting = h.db().get(balance).unwrap();
        assert_eq!(vesting.balance.amount, 4_000);
        assert_eq!(vesting.allowed_withdraw(now), 2_000);

        let withdraw = |amount| VestingBalanceWithdrawOperation {
            fee: Asset::core(0),
            vesting_balance: balance,
            owner: alice,
            amount: Asset::core(amount),
        };
        assert!(h.submit(TrxBuilder::single(withdraw(2_001)), &["alice"]).is_err());
        h.submit(TrxBuilder::single(withdraw(2_000)), &["alice"])
            .unwrap();
        h.produce_block().unwrap();
        assert_eq!(h.db().get(balance).unwrap().balance.amount, 2_000);
        h.assert_supply_consistent(AssetId::CORE).unwrap();
    }

    // ============================================================================
    // Governance Tests
    // ============================================================================

    #[test]
    fn test_proposed_parameters_take_effect_at_maintenance() {
        let mut h = TestHarness::new().unwrap();
        let mut parameters = h.db().get_global_properties().unwrap().parameters.clone();
        parameters.witness_pay_per_block = 25;
        let update = GlobalParametersUpdateOperation {
            fee: Asset::core(0),
            new_parameters: parameters,
        };

        // Nobody can sign for the committee directly
        let err = h.submit(TrxBuilder::single(update.clone()), &[]).unwrap_err();
        assert!(is_validation(&err, |e| {
            matches!(e, ValidationError::MissingAuthority(id) if *id == COMMITTEE_ACCOUNT)
        }));

        h.produce_block().unwrap();
        let trx = h.sign(TrxBuilder::single(update), &[]).unwrap();
        h.db_mut().apply_proposed_transaction(&trx).unwrap();
        assert_eq!(
            h.db()
                .get_global_properties()
                .unwrap()
                .parameters
                .witness_pay_per_block,
            10
        );

        h.produce_maintenance_block().unwrap();
        let reserve = treasury(&h);
        h.produce_block().unwrap();
        assert_eq!(treasury(&h), reserve - 25);
    }

    // ============================================================================
    // Block Tests
    // ============================================================================

    #[test]
    fn test_pop_block_requeues_transactions() {
        let mut h = TestHarness::new().unwrap();
        let (alice, bob) = (h.id("alice").unwrap(), h.id("bob").unwrap());

        h.produce_block().unwrap();
        h.submit(TrxBuilder::single(transfer(alice, bob, 777)), &["alice"])
            .unwrap();
        let block = h.produce_block().unwrap();
        assert_eq!(h.db().head_block_num().unwrap(), 2);

        let popped = h.db_mut().pop_block().unwrap();
        assert_eq!(popped.block_num(), block.block_num());
        assert_eq!(h.db().head_block_num().unwrap(), 1);
        assert_eq!(h.now().unwrap(), GENESIS_TIME + 5);
        // Requeued, so its effect is visible again in the pending state
        assert_eq!(h.db().pending_transactions().len(), 1);
        assert_eq!(h.core_balance("bob").unwrap(), FUNDED_BALANCE + 777);

        let again = h.produce_block().unwrap();
        assert_eq!(again.transactions, block.transactions);
        h.assert_supply_consistent(AssetId::CORE).unwrap();
    }

    #[test]
    fn test_pop_to_genesis() {
        let mut h = TestHarness::new().unwrap();
        h.produce_block().unwrap();
        h.produce_block().unwrap();
        h.db_mut().pop_block().unwrap();
        h.db_mut().pop_block().unwrap();
        assert_eq!(h.db().head_block_num().unwrap(), 0);
        assert!(matches!(
            h.db_mut().pop_block(),
            Err(ChainError::NoBlockToPop)
        ));
    }

    #[test]
    fn test_block_gossiped_to_second_node() {
        init_tracing();
        let mut producer = TestHarness::new().unwrap();
        let mut follower = TestHarness::new().unwrap();
        let (alice, bob) = (producer.id("alice").unwrap(), producer.id("bob").unwrap());

        producer
            .submit(TrxBuilder::single(transfer(alice, bob, 50)), &["alice"])
            .unwrap();
        let block = producer.produce_block().unwrap();

        let wire = Envelope::pack(&BlockMessage::new(block).unwrap())
            .unwrap()
            .to_bytes()
            .unwrap();
        let envelope = Envelope::from_bytes(&wire).unwrap();
        assert!(matches!(
            envelope.unpack::<TransactionMessage>(),
            Err(CodecError::TagMismatch { .. })
        ));
        let message: BlockMessage = envelope.unpack().unwrap();
        assert!(message.id_matches().unwrap());

        follower.apply_block(&message.block).unwrap();
        assert_eq!(
            follower.db().head_block_id().unwrap(),
            producer.db().head_block_id().unwrap()
        );
        assert_eq!(follower.core_balance("bob").unwrap(), FUNDED_BALANCE + 50);
    }

    #[test]
    fn test_tampered_block_rejected() {
        let mut producer = TestHarness::new().unwrap();
        let mut follower = TestHarness::new().unwrap();
        let (alice, bob) = (producer.id("alice").unwrap(), producer.id("bob").unwrap());

        producer
            .submit(TrxBuilder::single(transfer(alice, bob, 50)), &["alice"])
            .unwrap();
        let block = producer.produce_block().unwrap();

        let mut tampered = block.clone();
        tampered.transactions.clear();
        assert!(matches!(
            follower.apply_block(&tampered),
            Err(E2EError::Chain(ChainError::InvalidBlock(_)))
        ));

        let mut resigned = block.clone();
        resigned.header.timestamp += 5;
        resigned.sign(&account_key("mallory").unwrap()).unwrap();
        assert!(follower.apply_block(&resigned).is_err());

        assert_eq!(follower.db().head_block_num().unwrap(), 0);
        follower.apply_block(&block).unwrap();
        assert_eq!(follower.db().head_block_num().unwrap(), 1);
    }

    #[test]
    fn test_long_run_keeps_supply_consistent() {
        init_tracing();
        let mut h = TestHarness::new().unwrap();
        let names = ["alice", "bob", "carol"];
        let ids: Vec<AccountId> = names.iter().map(|n| h.id(n).unwrap()).collect();

        for round in 0..20usize {
            let from = round % 3;
            let to = (round + 1) % 3;
            let op = TransferOperation {
                memo: Bytes::from(format!("round {round}")),
                ..transfer(ids[from], ids[to], 1_000 + round as ShareType)
            };
            h.submit(TrxBuilder::single(op), &[names[from]]).unwrap();
            if round % 4 == 3 {
                h.produce_block().unwrap();
            }
        }
        h.produce_maintenance_block().unwrap();
        h.assert_supply_consistent(AssetId::CORE).unwrap();
        assert!(h.db().pending_transactions().is_empty());
    }
}
