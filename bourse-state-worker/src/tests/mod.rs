// Copyright (c) 2024 BOURSE LABS

use crate::test_exports::GenesisBuilder;
use crate::{BaseState, PendingState};
use assert_matches::assert_matches;
use bourse_models::config::constants::BASE_ASSET_ID;
use bourse_models::{
    Address, Asset, CollateralRecord, MarketIndexKey, OrderKind, OrderRecord, OrderType, Price,
    PropertyId, WithdrawCondition,
};
use bourse_state_exports::{ChainState, ChainStateExt, SetOrDelete};
use bourse_time::BourseTime;

fn alice() -> Address {
    Address::from_public_key_bytes(b"alice")
}

fn genesis() -> BaseState {
    let mut genesis = GenesisBuilder::new(BourseTime::from_secs(1_000));
    let account = genesis.account("alice", alice(), alice());
    genesis.user_asset("XYZ", account, 1_000_000, 100_000);
    genesis.build()
}

fn bid_index(ratio: u128, owner: Address) -> MarketIndexKey {
    MarketIndexKey::new(Price::new(ratio, 1, BASE_ASSET_ID), owner)
}

#[test]
fn test_genesis_allocates_ids_after_core_asset() {
    let state = genesis();
    assert_eq!(state.last_asset_id().unwrap(), 1);
    assert_eq!(state.last_account_id().unwrap(), 1);
    assert_eq!(state.get_asset_by_symbol("XYZ").unwrap().id, 1);
    assert_eq!(state.get_asset_by_id(BASE_ASSET_ID).unwrap().symbol, "BRS");
    assert_eq!(state.get_account_by_address(&alice()).unwrap().name, "alice");
    assert_eq!(state.database_version().unwrap(), Some(13));
}

#[test]
fn test_pending_writes_are_invisible_until_commit() {
    let mut base = genesis();
    {
        let mut pending = PendingState::new(&mut base);
        let mut asset = pending.get_asset_by_symbol("XYZ").unwrap();
        asset.current_supply = 10;
        pending.store_asset(asset);
        assert_eq!(pending.get_asset_by_id(1).unwrap().current_supply, 10);
        // dropped without commit
    }
    assert_eq!(base.get_asset_by_id(1).unwrap().current_supply, 0);

    let mut pending = PendingState::new(&mut base);
    let mut asset = pending.get_asset_by_id(1).unwrap();
    asset.current_supply = 20;
    pending.store_asset(asset);
    pending.commit();
    assert_eq!(base.get_asset_by_symbol("XYZ").unwrap().current_supply, 20);
}

#[test]
fn test_nested_layers() {
    let mut base = genesis();
    let mut outer = PendingState::new(&mut base);
    outer.new_asset_id().unwrap();
    {
        let mut inner = PendingState::new(&mut outer);
        assert_eq!(inner.new_asset_id().unwrap(), 3);
        inner.commit();
    }
    {
        let mut discarded = PendingState::new(&mut outer);
        assert_eq!(discarded.new_asset_id().unwrap(), 4);
    }
    assert_eq!(outer.last_asset_id().unwrap(), 3);
    outer.commit();
    assert_eq!(base.last_asset_id().unwrap(), 3);
}

#[test]
fn test_snapshot_reset() {
    let mut base = genesis();
    let mut pending = PendingState::new(&mut base);
    let snapshot = pending.get_snapshot();
    pending.mark_market_dirty(1, 0).unwrap();
    assert!(pending.dirty_markets().unwrap().contains(&(1, 0)));
    pending.reset_to_snapshot(snapshot);
    assert!(pending.dirty_markets().unwrap().is_empty());
    assert!(pending.take().is_empty());
}

#[test]
fn test_null_order_deletes() {
    let mut base = genesis();
    let index = bid_index(1 << 64, alice());
    let mut pending = PendingState::new(&mut base);
    pending.store_order(
        OrderKind::Bid,
        index,
        OrderRecord {
            balance: 100,
            ..Default::default()
        },
    );
    pending.commit();
    assert_eq!(base.get_order(OrderKind::Bid, &index).unwrap().balance, 100);

    let mut pending = PendingState::new(&mut base);
    pending.store_order(OrderKind::Bid, index, OrderRecord::default());
    assert_matches!(
        pending.changes().orders.get(&(OrderKind::Bid, index)),
        Some(SetOrDelete::Delete)
    );
    assert_eq!(pending.get_order(OrderKind::Bid, &index), None);
    pending.commit();
    assert_eq!(base.get_order(OrderKind::Bid, &index), None);
}

#[test]
fn test_symbol_lookup_sees_through_layers() {
    let mut base = genesis();
    let mut pending = PendingState::new(&mut base);
    let mut asset = pending.get_asset_by_id(1).unwrap();
    asset.symbol = "XYZ.SUB".to_string();
    pending.store_asset(asset);
    assert_eq!(pending.get_asset_by_symbol("XYZ"), None);
    assert_eq!(pending.get_asset_by_symbol("XYZ.SUB").unwrap().id, 1);
    pending.commit();
    assert_eq!(base.get_asset_by_symbol("XYZ"), None);
    assert_eq!(base.get_asset_by_symbol("XYZ.SUB").unwrap().id, 1);
}

#[test]
fn test_clock_override() {
    let mut base = genesis();
    let mut pending = PendingState::new(&mut base);
    assert_eq!(pending.now(), BourseTime::from_secs(1_000));
    pending.set_now(BourseTime::from_secs(1_010));
    assert_eq!(pending.now(), BourseTime::from_secs(1_010));
    pending.commit();
    assert_eq!(base.now(), BourseTime::from_secs(1_010));
}

#[test]
fn test_market_books_are_sorted() {
    let bob = Address::from_public_key_bytes(b"bob");
    let mut genesis = GenesisBuilder::new(BourseTime::from_secs(1_000));
    genesis.order(OrderKind::Bid, bid_index(3 << 64, alice()), 10);
    genesis.order(OrderKind::Bid, bid_index(1 << 64, bob), 20);
    genesis.order(OrderKind::Ask, bid_index(2 << 64, bob), 30);
    genesis.order(
        OrderKind::Bid,
        MarketIndexKey::new(Price::new(1 << 64, 2, BASE_ASSET_ID), bob),
        40,
    );
    genesis.position(
        bid_index(1 << 63, alice()),
        CollateralRecord {
            collateral_balance: 300,
            payoff_balance: 100,
            ..Default::default()
        },
    );
    let state = genesis.build();

    let bids: Vec<_> = state
        .market_orders(OrderKind::Bid, 1, BASE_ASSET_ID)
        .map(|order| order.state.balance)
        .collect();
    assert_eq!(bids, vec![20, 10]);
    let positions: Vec<_> = state.market_positions(1, BASE_ASSET_ID).collect();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].order_type, OrderType::Cover);
}

#[test]
fn test_genesis_balances_accumulate() {
    let mut genesis = GenesisBuilder::new(BourseTime::from_secs(1_000));
    let condition = WithdrawCondition::Signature { owner: alice() };
    genesis.balance(condition.clone(), Asset::new(5, BASE_ASSET_ID));
    genesis.balance(condition.clone(), Asset::new(7, BASE_ASSET_ID));
    let state = genesis.build();
    let id = condition.balance_id(BASE_ASSET_ID).unwrap();
    assert_eq!(state.get_balance(&id).unwrap().balance, 12);
    assert_eq!(
        state.get_property(PropertyId::LastAssetId),
        None,
        "the core asset does not consume an allocated id"
    );
}
