// Copyright (c) 2024 BOURSE LABS

use super::mock::*;
use crate::{CustomEvaluator, EvaluatorRegistry, TransactionEvaluationState, TransactionEvaluator};
use assert_matches::assert_matches;
use bourse_evaluation_exports::{ErrorCategory, EvaluationConfig, EvaluationError};
use bourse_models::config::constants::{BASE_ASSET_ID, MAX_TRANSACTION_EXPIRATION, PRICE_ONE};
use bourse_models::operation::{IssueAssetOperation, IssueSource, OrderOperation};
use bourse_models::{
    Asset, MarketIndexKey, MultisigCondition, ObjectId, ObjectKind, OperationType, OrderKind,
    Price,
};
use bourse_state_exports::{ChainState, MockChainState, StateError};
use bourse_time::BourseTime;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Custom operation requiring a tip, in core shares, encoded as a little endian i64
struct TipJar;

impl CustomEvaluator for TipJar {
    fn evaluate(
        &self,
        context: &mut TransactionEvaluationState<'_>,
        payload: &[u8],
    ) -> Result<(), EvaluationError> {
        let bytes: [u8; 8] = payload
            .try_into()
            .map_err(|_| EvaluationError::InvalidAmount(0))?;
        let tip = i64::from_le_bytes(bytes);
        if tip <= 0 {
            return Err(EvaluationError::InvalidAmount(tip));
        }
        context.add_min_fee(Asset::new(tip, BASE_ASSET_ID))
    }
}

const TIP_JAR: u32 = 7;

fn tip(amount: i64) -> OperationType {
    OperationType::Custom {
        type_id: TIP_JAR,
        payload: amount.to_le_bytes().to_vec(),
    }
}

/// Custom operation that only needs control of an object, the payload is its little endian id
struct ObjectGuard;

impl CustomEvaluator for ObjectGuard {
    fn evaluate(
        &self,
        context: &mut TransactionEvaluationState<'_>,
        payload: &[u8],
    ) -> Result<(), EvaluationError> {
        let bytes: [u8; 8] = payload
            .try_into()
            .map_err(|_| EvaluationError::InvalidAmount(0))?;
        context.verify_object_authority(ObjectId::from_le_bytes(bytes))
    }
}

const TOUCH_OBJECT: u32 = 8;

fn touch(id: ObjectId) -> OperationType {
    OperationType::Custom {
        type_id: TOUCH_OBJECT,
        payload: id.to_le_bytes().to_vec(),
    }
}

fn tip_evaluator() -> TransactionEvaluator {
    let registry = EvaluatorRegistry::builder()
        .register(TIP_JAR, TipJar)
        .unwrap()
        .build();
    TransactionEvaluator::new(EvaluationConfig::default(), Arc::new(registry))
}

#[test]
fn test_expired_transaction_never_touches_state() {
    let mut state = MockChainState::new();
    state.expect_now().return_const(now());
    state.expect_apply_changes().never();

    let mut tx = transaction(
        vec![withdraw(alice(), Asset::new(1, BASE_ASSET_ID))],
        &[alice()],
    );
    tx.expiration = BourseTime::from_secs(NOW_SECS - 1);
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::TransactionExpired { expiration, .. })
            if expiration == BourseTime::from_secs(NOW_SECS - 1)
    );
}

#[test]
fn test_transaction_envelope_bounds() {
    let (genesis, _) = genesis();
    let mut state = genesis.build();

    // expiring exactly now is still accepted
    let mut tx = transaction(vec![], &[]);
    tx.expiration = now();
    let output = evaluator().evaluate(&mut state, &tx).unwrap();
    assert_eq!(output.operation_count, 0);
    assert!(output.fees_paid.is_empty());

    tx.expiration = now()
        .saturating_add(MAX_TRANSACTION_EXPIRATION)
        .saturating_add(BourseTime::from_secs(1));
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::ExpirationTooFar { .. })
    );

    let config = EvaluationConfig {
        max_operations_per_transaction: 2,
        ..Default::default()
    };
    let evaluator = TransactionEvaluator::new(config, Arc::new(EvaluatorRegistry::default()));
    let tx = transaction(
        vec![
            withdraw(alice(), Asset::new(1, BASE_ASSET_ID)),
            deposit(alice(), Asset::new(1, BASE_ASSET_ID)),
            deposit(alice(), Asset::new(1, BASE_ASSET_ID)),
        ],
        &[alice()],
    );
    assert_matches!(
        evaluator.evaluate(&mut state, &tx),
        Err(EvaluationError::TooManyOperations(3))
    );
}

#[test]
fn test_failed_operation_rolls_back_transaction() {
    let (mut genesis, account) = genesis();
    let xyz = genesis.user_asset("XYZ", account, 1_000, 1);
    let usd = genesis.market_asset("USD");
    let mut state = genesis.build();
    let at = MarketIndexKey::new(Price::new(PRICE_ONE, usd, BASE_ASSET_ID), alice());

    let tx = transaction(
        vec![
            withdraw(alice(), Asset::new(100, BASE_ASSET_ID)),
            OperationType::Ask(OrderOperation {
                amount: 100,
                index: at,
            }),
            OperationType::IssueAsset(IssueAssetOperation {
                asset_id: xyz,
                amount: 1_001,
                source: IssueSource::Supply,
            }),
        ],
        &[alice()],
    );
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::OverIssue { .. })
    );
    assert_eq!(balance_of(&state, alice(), BASE_ASSET_ID), ALICE_CORE_BALANCE);
    assert!(state.get_order(OrderKind::Ask, &at).is_none());
    assert_eq!(state.get_asset_by_id(xyz).unwrap().current_supply, 0);
}

#[test]
fn test_snapshot_restores_state_and_ledger() {
    let (genesis, _) = genesis();
    let mut state = genesis.build();
    let config = EvaluationConfig::default();
    let signers = BTreeSet::from([alice()]);
    let evaluator = evaluator();

    let mut context = TransactionEvaluationState::new(&mut state, &config, &signers);
    evaluator
        .evaluate_operation(&mut context, &withdraw(alice(), Asset::new(10, BASE_ASSET_ID)))
        .unwrap();
    let snapshot = context.get_snapshot();
    evaluator
        .evaluate_operation(&mut context, &withdraw(alice(), Asset::new(5, BASE_ASSET_ID)))
        .unwrap();
    assert_eq!(context.balance(BASE_ASSET_ID), 15);

    context.reset_to_snapshot(snapshot);
    assert_eq!(context.balance(BASE_ASSET_ID), 10);
    assert_eq!(
        balance_of(context.state(), alice(), BASE_ASSET_ID),
        ALICE_CORE_BALANCE - 10
    );
    assert_eq!(
        context.settle().unwrap(),
        BTreeMap::from([(BASE_ASSET_ID, 10)])
    );

    // dropped without commit
    drop(context);
    assert_eq!(balance_of(&state, alice(), BASE_ASSET_ID), ALICE_CORE_BALANCE);
}

#[test]
fn test_custom_operations_dispatch_through_registry() {
    let (genesis, _) = genesis();
    let mut state = genesis.build();

    let tx = transaction(
        vec![withdraw(alice(), Asset::new(10, BASE_ASSET_ID)), tip(10)],
        &[alice()],
    );
    let output = tip_evaluator().evaluate(&mut state, &tx).unwrap();
    assert_eq!(output.fees_paid, BTreeMap::from([(BASE_ASSET_ID, 10)]));

    let tx = transaction(
        vec![withdraw(alice(), Asset::new(5, BASE_ASSET_ID)), tip(10)],
        &[alice()],
    );
    assert_matches!(
        tip_evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::InsufficientFee { paid: 5, required: 10, .. })
    );

    let tx = transaction(
        vec![OperationType::Custom {
            type_id: TIP_JAR,
            payload: vec![1, 2, 3],
        }],
        &[alice()],
    );
    assert_matches!(
        tip_evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::InvalidAmount(0))
    );

    // not registered on the default evaluator
    let tx = transaction(vec![tip(10)], &[alice()]);
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::UnknownOperationType(TIP_JAR))
    );
    assert_eq!(
        balance_of(&state, alice(), BASE_ASSET_ID),
        ALICE_CORE_BALANCE - 10
    );
}

#[test]
fn test_object_authority_follows_owner_chain() {
    let (mut genesis, account) = genesis();
    let mirror = genesis.object(ObjectKind::Account(account));
    let edge = genesis.object(ObjectKind::Edge {
        from: mirror,
        to: mirror,
        name: "self".to_string(),
    });
    let nested = genesis.object(ObjectKind::Base {
        owner_object: edge,
        owners: MultisigCondition::default(),
    });
    let mut state = genesis.build();
    let registry = Arc::new(
        EvaluatorRegistry::builder()
            .register(TOUCH_OBJECT, ObjectGuard)
            .unwrap()
            .build(),
    );
    let evaluator = TransactionEvaluator::new(EvaluationConfig::default(), registry.clone());

    evaluator
        .evaluate(&mut state, &transaction(vec![touch(nested)], &[alice()]))
        .unwrap();
    assert_matches!(
        evaluator.evaluate(&mut state, &transaction(vec![touch(nested)], &[bob()])),
        Err(EvaluationError::InsufficientAuthority)
    );
    assert_matches!(
        evaluator.evaluate(&mut state, &transaction(vec![touch(99)], &[alice()])),
        Err(EvaluationError::StateError(StateError::UnknownObject(99)))
    );

    let shallow = TransactionEvaluator::new(
        EvaluationConfig {
            owner_dependency_max_depth: 2,
            ..Default::default()
        },
        registry,
    );
    shallow
        .evaluate(&mut state, &transaction(vec![touch(edge)], &[alice()]))
        .unwrap();
    let err = shallow
        .evaluate(&mut state, &transaction(vec![touch(nested)], &[alice()]))
        .unwrap_err();
    assert_matches!(
        err,
        EvaluationError::StateError(StateError::OwnershipTooDeep(id, 2)) if id == nested
    );
    assert_eq!(err.category(), ErrorCategory::InvariantViolation);
}
