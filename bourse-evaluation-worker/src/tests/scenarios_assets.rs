// Copyright (c) 2024 BOURSE LABS

use super::mock::*;
use assert_matches::assert_matches;
use bourse_evaluation_exports::{ErrorCategory, EvaluationError};
use bourse_models::config::constants::{
    BASE_ASSET_ID, LONG_SYMBOL_REGISTRATION_FEE, MAX_MARKET_FEE_RATE, MAX_SHARES,
};
use bourse_models::operation::{
    AssetUpdatePermissionsOperation, AssetUpdatePropertiesOperation,
    AssetUpdateWhitelistOperation, ChipsOperation, CreateAssetOperation, IssueAssetOperation,
    IssueSource, WhitelistAction,
};
use bourse_models::{
    AccountId, Asset, AssetFlag, AssetFlags, AssetId, AssetIssuer, MultisigCondition,
    OperationType, ShareAmount,
};
use bourse_state_exports::{ChainState, ChainStateExt};
use bourse_state_worker::BaseState;
use std::collections::BTreeMap;

fn create(
    symbol: &str,
    issuer: AccountId,
    max_supply: ShareAmount,
    precision: u64,
) -> OperationType {
    OperationType::CreateAsset(CreateAssetOperation {
        symbol: symbol.to_string(),
        name: format!("{} shares", symbol.to_lowercase()),
        description: String::new(),
        public_data: serde_json::json!({ "website": "https://bourse.example" }),
        issuer: AssetIssuer::User(issuer),
        max_supply,
        precision,
        initial_supply: 0,
        initial_collateral: 0,
    })
}

fn issue(asset_id: AssetId, amount: ShareAmount) -> OperationType {
    OperationType::IssueAsset(IssueAssetOperation {
        asset_id,
        amount,
        source: IssueSource::Supply,
    })
}

fn flags(list: &[AssetFlag]) -> AssetFlags {
    let mut flags = AssetFlags::empty();
    for flag in list {
        flags.insert(*flag);
    }
    flags
}

/// Genesis holding the user issued asset "XYZ" (id 1) controlled by alice
fn xyz_genesis() -> (BaseState, AssetId) {
    let (mut genesis, account) = genesis();
    let id = genesis.user_asset("XYZ", account, 1_000_000, 100_000);
    (genesis.build(), id)
}

#[test]
fn test_create_asset_pays_registration_fee() {
    let (genesis, account) = genesis();
    let mut state = genesis.build();
    let previous_id = state.last_asset_id().unwrap();
    let fee = Asset::new(LONG_SYMBOL_REGISTRATION_FEE, BASE_ASSET_ID);

    let mut op = create("GOLDBAR", account, 1_000_000, 100_000);
    if let OperationType::CreateAsset(create) = &mut op {
        create.initial_supply = 1_000;
    }
    let new_id = previous_id + 1;
    let tx = transaction(
        vec![
            withdraw(alice(), fee),
            op,
            deposit(alice(), Asset::new(1_000, new_id)),
        ],
        &[alice()],
    );
    let output = evaluator().evaluate(&mut state, &tx).unwrap();

    assert_eq!(output.fees_paid, BTreeMap::from([(BASE_ASSET_ID, fee.amount)]));
    assert_eq!(output.operation_count, 3);
    let record = state.get_asset_by_symbol("GOLDBAR").unwrap();
    assert_eq!(record.id, new_id);
    assert!(record.id > previous_id);
    assert_eq!(record.current_supply, 1_000);
    assert_eq!(record.max_supply, 1_000_000);
    assert_eq!(record.registration_date, now());
    assert!(record.authority.is_satisfied_by(&tx.signers));
    assert_eq!(state.last_asset_id().unwrap(), new_id);
    assert_eq!(balance_of(&state, alice(), new_id), 1_000);
    assert_eq!(
        balance_of(&state, alice(), BASE_ASSET_ID),
        ALICE_CORE_BALANCE - fee.amount
    );
}

#[test]
fn test_create_asset_without_fee_is_rejected() {
    let (genesis, account) = genesis();
    let mut state = genesis.build();
    let tx = transaction(
        vec![
            withdraw(
                alice(),
                Asset::new(LONG_SYMBOL_REGISTRATION_FEE - 1, BASE_ASSET_ID),
            ),
            create("GOLDBAR", account, 1_000_000, 100_000),
        ],
        &[alice()],
    );
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::InsufficientFee { asset_id: BASE_ASSET_ID, paid, required })
            if paid == LONG_SYMBOL_REGISTRATION_FEE - 1 && required == LONG_SYMBOL_REGISTRATION_FEE
    );
    assert!(state.get_asset_by_symbol("GOLDBAR").is_none());
    assert_eq!(balance_of(&state, alice(), BASE_ASSET_ID), ALICE_CORE_BALANCE);
}

#[test]
fn test_create_asset_rejects_bad_parameters() {
    let (mut genesis, account) = genesis();
    genesis.user_asset("SILVER", account, 1_000, 1);
    let mut state = genesis.build();
    let evaluator = evaluator();
    let mut rejected = |op: OperationType| {
        let fee = withdraw(
            alice(),
            Asset::new(LONG_SYMBOL_REGISTRATION_FEE, BASE_ASSET_ID),
        );
        evaluator
            .evaluate(&mut state, &transaction(vec![fee, op], &[alice()]))
            .unwrap_err()
    };

    assert_matches!(
        rejected(create("ab", account, 1_000, 1)),
        EvaluationError::InvalidSymbol(_)
    );
    assert_matches!(
        rejected(create("BIT123", account, 1_000, 1)),
        EvaluationError::InvalidSymbol(_)
    );
    assert_matches!(
        rejected(create("SILVER", account, 1_000, 1)),
        EvaluationError::SymbolInUse(_)
    );
    assert_matches!(
        rejected(create("GOLDBAR", account, 0, 1)),
        EvaluationError::InvalidMaxSupply(0)
    );
    assert_matches!(
        rejected(create("GOLDBAR", account, MAX_SHARES + 1, 1)),
        EvaluationError::InvalidMaxSupply(_)
    );
    assert_matches!(
        rejected(create("GOLDBAR", account, 1_000, 3)),
        EvaluationError::InvalidPrecision(3)
    );
    assert_matches!(
        rejected(create("GOLDBAR", account + 7, 1_000, 1)),
        EvaluationError::UnknownAccount(_)
    );
    let err = rejected(create("GOLDBAR", account, 1_000, 3));
    assert_eq!(err.category(), ErrorCategory::MalformedInput);
}

#[test]
fn test_sub_symbol_needs_parent_authority() {
    let (mut genesis, account) = genesis();
    genesis.user_asset("SILVER", account, 1_000, 1);
    let bob_account = genesis.account("bob", bob(), bob());
    genesis.balance(
        signature(bob()),
        Asset::new(LONG_SYMBOL_REGISTRATION_FEE, BASE_ASSET_ID),
    );
    let mut state = genesis.build();
    let fee = |owner| {
        withdraw(
            owner,
            Asset::new(LONG_SYMBOL_REGISTRATION_FEE, BASE_ASSET_ID),
        )
    };

    let tx = transaction(
        vec![fee(bob()), create("SILVER.BOB1", bob_account, 1_000, 1)],
        &[bob()],
    );
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::InsufficientAuthority)
    );

    let tx = transaction(
        vec![fee(alice()), create("COPPER.A1", account, 1_000, 1)],
        &[alice()],
    );
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::UnknownAssetSymbol(parent)) if parent == "COPPER"
    );

    let tx = transaction(
        vec![fee(alice()), create("SILVER.A1", account, 1_000, 1)],
        &[alice()],
    );
    evaluator().evaluate(&mut state, &tx).unwrap();
    assert!(state.get_asset_by_symbol("SILVER.A1").is_some());
}

#[test]
fn test_issue_asset_respects_max_supply() {
    let (mut state, xyz) = xyz_genesis();

    let tx = transaction(
        vec![issue(xyz, 500_000), deposit(alice(), Asset::new(500_000, xyz))],
        &[alice()],
    );
    evaluator().evaluate(&mut state, &tx).unwrap();
    let record = state.get_asset_by_id(xyz).unwrap();
    assert_eq!(record.current_supply, 500_000);
    assert_eq!(balance_of(&state, alice(), xyz), 500_000);

    let tx = transaction(
        vec![issue(xyz, 600_000), deposit(alice(), Asset::new(600_000, xyz))],
        &[alice()],
    );
    let err = evaluator().evaluate(&mut state, &tx).unwrap_err();
    assert_eq!(
        err,
        EvaluationError::OverIssue {
            asset_id: xyz,
            amount: 600_000,
            available: 500_000
        }
    );
    assert_eq!(err.category(), ErrorCategory::InvariantViolation);

    let headroom = record.max_supply - record.current_supply;
    let tx = transaction(vec![issue(xyz, headroom + 1)], &[alice()]);
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::OverIssue { .. })
    );
    assert_eq!(state.get_asset_by_id(xyz).unwrap().current_supply, 500_000);
}

#[test]
fn test_issue_asset_needs_authority() {
    let (mut state, xyz) = xyz_genesis();
    let tx = transaction(vec![issue(xyz, 10)], &[bob()]);
    let err = evaluator().evaluate(&mut state, &tx).unwrap_err();
    assert_matches!(err, EvaluationError::InsufficientAuthority);
    assert_eq!(err.category(), ErrorCategory::AuthorityFailure);

    let tx = transaction(vec![issue(BASE_ASSET_ID, 10)], &[alice()]);
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::NotUserIssued(BASE_ASSET_ID))
    );
}

#[test]
fn test_issue_from_collected_fees() {
    let (mut genesis, account) = genesis();
    let xyz = genesis.user_asset("XYZ", account, 1_000_000, 100_000);
    genesis.update_asset(xyz, |record| record.collected_fees = 100);
    let mut state = genesis.build();
    let from_fees = |amount| {
        OperationType::IssueAsset(IssueAssetOperation {
            asset_id: xyz,
            amount,
            source: IssueSource::CollectedFees,
        })
    };

    let tx = transaction(vec![from_fees(150)], &[alice()]);
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::AmountTooLarge { available: 100, .. })
    );

    let tx = transaction(
        vec![from_fees(60), deposit(alice(), Asset::new(60, xyz))],
        &[alice()],
    );
    evaluator().evaluate(&mut state, &tx).unwrap();
    let record = state.get_asset_by_id(xyz).unwrap();
    assert_eq!(record.collected_fees, 40);
    assert_eq!(record.current_supply, 0);
    assert_eq!(balance_of(&state, alice(), xyz), 60);
}

#[test]
fn test_noop_updates_are_rejected() {
    let (mut state, xyz) = xyz_genesis();
    let tx = transaction(
        vec![OperationType::AssetUpdateProperties(
            AssetUpdatePropertiesOperation {
                asset_id: xyz,
                ..Default::default()
            },
        )],
        &[alice()],
    );
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::NoopUpdate)
    );

    let tx = transaction(
        vec![OperationType::AssetUpdatePermissions(
            AssetUpdatePermissionsOperation {
                asset_id: xyz,
                ..Default::default()
            },
        )],
        &[alice()],
    );
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::NoopUpdate)
    );
}

#[test]
fn test_outstanding_shares_lock_attributes() {
    let (mut genesis, account) = genesis();
    let xyz = genesis.user_asset("XYZ", account, 1_000_000, 100_000);
    genesis.update_asset(xyz, |record| record.current_supply = 10);
    let mut state = genesis.build();
    let update = |op: AssetUpdatePropertiesOperation| {
        transaction(
            vec![OperationType::AssetUpdateProperties(
                AssetUpdatePropertiesOperation {
                    asset_id: xyz,
                    ..op
                },
            )],
            &[alice()],
        )
    };

    for op in [
        AssetUpdatePropertiesOperation {
            precision: Some(1_000),
            ..Default::default()
        },
        AssetUpdatePropertiesOperation {
            max_supply: Some(2_000_000),
            ..Default::default()
        },
        AssetUpdatePropertiesOperation {
            withdrawal_fee: Some(5),
            ..Default::default()
        },
        AssetUpdatePropertiesOperation {
            market_fee_rate: Some(10),
            ..Default::default()
        },
    ] {
        assert_matches!(
            evaluator().evaluate(&mut state, &update(op)),
            Err(EvaluationError::OutstandingSharesExist(id)) if id == xyz
        );
    }

    // descriptive fields stay editable
    let tx = update(AssetUpdatePropertiesOperation {
        name: Some("renamed".to_string()),
        ..Default::default()
    });
    evaluator().evaluate(&mut state, &tx).unwrap();
    assert_eq!(state.get_asset_by_id(xyz).unwrap().name, "renamed");
}

#[test]
fn test_dynamic_flags_unlock_attributes() {
    let (mut genesis, account) = genesis();
    let xyz = genesis.user_asset("XYZ", account, 1_000_000, 100_000);
    genesis.update_asset(xyz, |record| {
        record.current_supply = 10;
        record.authority_flag_permissions =
            flags(&[AssetFlag::DynamicMaxSupply, AssetFlag::DynamicFees]);
        record.active_flags = flags(&[AssetFlag::DynamicMaxSupply, AssetFlag::DynamicFees]);
    });
    let mut state = genesis.build();

    let tx = transaction(
        vec![OperationType::AssetUpdateProperties(
            AssetUpdatePropertiesOperation {
                asset_id: xyz,
                max_supply: Some(2_000_000),
                withdrawal_fee: Some(5),
                market_fee_rate: Some(25),
                ..Default::default()
            },
        )],
        &[alice()],
    );
    evaluator().evaluate(&mut state, &tx).unwrap();
    let record = state.get_asset_by_id(xyz).unwrap();
    assert_eq!(record.max_supply, 2_000_000);
    assert_eq!(record.withdrawal_fee, 5);
    assert_eq!(record.market_fee_rate, 25);

    let tx = transaction(
        vec![OperationType::AssetUpdateProperties(
            AssetUpdatePropertiesOperation {
                asset_id: xyz,
                max_supply: Some(9),
                ..Default::default()
            },
        )],
        &[alice()],
    );
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::InvalidMaxSupply(9))
    );
}

#[test]
fn test_permissions_only_shrink_with_outstanding_shares() {
    let (mut genesis, account) = genesis();
    let xyz = genesis.user_asset("XYZ", account, 1_000_000, 100_000);
    genesis.update_asset(xyz, |record| {
        record.current_supply = 10;
        record.authority_flag_permissions = flags(&[AssetFlag::HaltedWithdrawals]);
    });
    let mut state = genesis.build();
    let permissions = |op: AssetUpdatePermissionsOperation| {
        transaction(
            vec![OperationType::AssetUpdatePermissions(
                AssetUpdatePermissionsOperation {
                    asset_id: xyz,
                    ..op
                },
            )],
            &[alice()],
        )
    };

    let tx = permissions(AssetUpdatePermissionsOperation {
        authority_flag_permissions: Some(flags(&[
            AssetFlag::HaltedWithdrawals,
            AssetFlag::DynamicFees,
        ])),
        ..Default::default()
    });
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::OutstandingSharesExist(_))
    );

    let tx = permissions(AssetUpdatePermissionsOperation {
        active_flags: Some(flags(&[AssetFlag::RestrictedDeposits])),
        ..Default::default()
    });
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::PermissionNotAvailable {
            flag: AssetFlag::RestrictedDeposits,
            ..
        })
    );

    let tx = permissions(AssetUpdatePermissionsOperation {
        active_flags: Some(flags(&[AssetFlag::HaltedWithdrawals])),
        ..Default::default()
    });
    evaluator().evaluate(&mut state, &tx).unwrap();
    assert!(state
        .get_asset_by_id(xyz)
        .unwrap()
        .flag_is_active(AssetFlag::HaltedWithdrawals));

    let tx = permissions(AssetUpdatePermissionsOperation {
        authority_flag_permissions: Some(AssetFlags::empty()),
        ..Default::default()
    });
    evaluator().evaluate(&mut state, &tx).unwrap();
    assert_eq!(
        state
            .get_asset_by_id(xyz)
            .unwrap()
            .authority_flag_permissions,
        AssetFlags::empty()
    );
}

#[test]
fn test_invalid_authority_is_rejected() {
    let (mut state, xyz) = xyz_genesis();
    let tx = transaction(
        vec![OperationType::AssetUpdatePermissions(
            AssetUpdatePermissionsOperation {
                asset_id: xyz,
                authority: Some(Default::default()),
                ..Default::default()
            },
        )],
        &[alice()],
    );
    assert_matches!(
        evaluator().evaluate(&mut state, &tx),
        Err(EvaluationError::InvalidAuthority { required: 0, owners: 0 })
    );
}

#[test]
fn test_whitelist_needs_restricted_deposits() {
    let (mut genesis, account) = genesis();
    let xyz = genesis.user_asset("XYZ", account, 1_000_000, 100_000);
    let restricted = genesis.user_asset("RESTRICT", account, 1_000_000, 100_000);
    genesis.update_asset(restricted, |record| {
        record.authority_flag_permissions = flags(&[AssetFlag::RestrictedDeposits]);
        record.active_flags = flags(&[AssetFlag::RestrictedDeposits]);
    });
    let mut state = genesis.build();
    let whitelist = |asset_id, action| {
        transaction(
            vec![OperationType::AssetUpdateWhitelist(
                AssetUpdateWhitelistOperation {
                    asset_id,
                    action,
                    address: bob(),
                },
            )],
            &[alice()],
        )
    };

    assert_matches!(
        evaluator().evaluate(&mut state, &whitelist(xyz, WhitelistAction::Add)),
        Err(EvaluationError::WhitelistDisabled(_))
    );
    evaluator()
        .evaluate(&mut state, &whitelist(restricted, WhitelistAction::Add))
        .unwrap();
    assert!(state
        .get_asset_by_id(restricted)
        .unwrap()
        .whitelist
        .contains(&bob()));
    evaluator()
        .evaluate(&mut state, &whitelist(restricted, WhitelistAction::Remove))
        .unwrap();
    assert!(state
        .get_asset_by_id(restricted)
        .unwrap()
        .whitelist
        .is_empty());
}

#[test]
fn test_create_game_chip_asset() {
    let (mut genesis, _) = genesis();
    let bob_account = genesis.account("bob", bob(), bob());
    let game = genesis.game("poker", bob_account);
    let mut state = genesis.build();
    let fee = LONG_SYMBOL_REGISTRATION_FEE;
    let new_id = state.last_asset_id().unwrap() + 1;

    let mut op = create("POKERCHP", bob_account, 1_000_000, 100_000);
    if let OperationType::CreateAsset(create) = &mut op {
        create.issuer = AssetIssuer::Game(game);
        create.initial_supply = 12;
        create.initial_collateral = 36;
    }
    // 36 core shares back the 12 initial chips, one more chip costs 3
    let tx = transaction(
        vec![
            withdraw(alice(), Asset::new(fee + 36 + 3, BASE_ASSET_ID)),
            op,
            deposit(alice(), Asset::new(12, new_id)),
            OperationType::BuyChips(ChipsOperation {
                owner: alice(),
                amount: Asset::new(1, new_id),
            }),
        ],
        &[alice()],
    );
    let output = evaluator().evaluate(&mut state, &tx).unwrap();

    assert_eq!(output.fees_paid, BTreeMap::from([(BASE_ASSET_ID, fee)]));
    let record = state.get_asset_by_id(new_id).unwrap();
    assert_eq!(record.issuer, AssetIssuer::Game(game));
    assert_eq!(record.authority, MultisigCondition::single(bob()));
    assert_eq!((record.current_supply, record.current_collateral), (13, 39));
    assert_eq!(state.get_game_by_id(game).unwrap().asset_id, Some(new_id));
    assert_eq!(balance_of(&state, alice(), new_id), 13);
    assert_eq!(
        balance_of(&state, alice(), BASE_ASSET_ID),
        ALICE_CORE_BALANCE - fee - 39
    );
}

#[test]
fn test_create_asset_issuer_and_identity_rules() {
    let (genesis, account) = genesis();
    let mut state = genesis.build();
    let evaluator = evaluator();
    let with = |edit: fn(&mut CreateAssetOperation)| {
        let mut op = create("GOLDBAR", account, 1_000, 1);
        if let OperationType::CreateAsset(create) = &mut op {
            edit(create);
        }
        transaction(
            vec![
                withdraw(
                    alice(),
                    Asset::new(LONG_SYMBOL_REGISTRATION_FEE, BASE_ASSET_ID),
                ),
                op,
            ],
            &[alice()],
        )
    };

    assert_matches!(
        evaluator.evaluate(&mut state, &with(|op| op.issuer = AssetIssuer::Game(99))),
        Err(EvaluationError::UnknownGame(99))
    );
    let err = evaluator
        .evaluate(&mut state, &with(|op| op.issuer = AssetIssuer::Market))
        .unwrap_err();
    assert_matches!(err, EvaluationError::InvalidIssuer);
    assert_eq!(err.category(), ErrorCategory::MalformedInput);
    assert_matches!(
        evaluator.evaluate(&mut state, &with(|op| op.issuer = AssetIssuer::Genesis)),
        Err(EvaluationError::InvalidIssuer)
    );
    assert_matches!(
        evaluator.evaluate(&mut state, &with(|op| op.name.clear())),
        Err(EvaluationError::EmptyName)
    );

    // a record already sits at the next identifier
    let mut stray = state.get_asset_by_id(BASE_ASSET_ID).unwrap();
    stray.id = state.last_asset_id().unwrap() + 1;
    stray.symbol = "STRAY".to_string();
    state.store_asset(stray);
    let err = evaluator.evaluate(&mut state, &with(|_| ())).unwrap_err();
    assert_eq!(
        err,
        EvaluationError::AssetIdInUse(state.last_asset_id().unwrap() + 1)
    );
    assert_eq!(err.category(), ErrorCategory::InvariantViolation);
    assert!(state.get_asset_by_symbol("GOLDBAR").is_none());
}

#[test]
fn test_fee_updates_are_bounded() {
    let (mut state, xyz) = xyz_genesis();
    let update = |op: AssetUpdatePropertiesOperation| {
        transaction(
            vec![OperationType::AssetUpdateProperties(
                AssetUpdatePropertiesOperation {
                    asset_id: xyz,
                    ..op
                },
            )],
            &[alice()],
        )
    };

    assert_matches!(
        evaluator().evaluate(
            &mut state,
            &update(AssetUpdatePropertiesOperation {
                withdrawal_fee: Some(-1),
                ..Default::default()
            })
        ),
        Err(EvaluationError::InvalidWithdrawalFee(-1))
    );
    assert_matches!(
        evaluator().evaluate(
            &mut state,
            &update(AssetUpdatePropertiesOperation {
                withdrawal_fee: Some(1_000_001),
                ..Default::default()
            })
        ),
        Err(EvaluationError::InvalidWithdrawalFee(1_000_001))
    );
    let err = evaluator()
        .evaluate(
            &mut state,
            &update(AssetUpdatePropertiesOperation {
                market_fee_rate: Some(MAX_MARKET_FEE_RATE + 1),
                ..Default::default()
            }),
        )
        .unwrap_err();
    assert_eq!(
        err,
        EvaluationError::InvalidMarketFeeRate(MAX_MARKET_FEE_RATE + 1)
    );
    assert_eq!(err.category(), ErrorCategory::MalformedInput);

    // the bounds themselves are accepted
    let tx = update(AssetUpdatePropertiesOperation {
        withdrawal_fee: Some(1_000_000),
        market_fee_rate: Some(MAX_MARKET_FEE_RATE),
        ..Default::default()
    });
    evaluator().evaluate(&mut state, &tx).unwrap();
    let record = state.get_asset_by_id(xyz).unwrap();
    assert_eq!(record.withdrawal_fee, 1_000_000);
    assert_eq!(record.market_fee_rate, MAX_MARKET_FEE_RATE);
}
