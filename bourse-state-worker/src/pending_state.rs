// Copyright (c) 2024 BOURSE LABS

//! The pending state represents the chain state as seen through a parent layer
//! plus the changes written since the pending state was created.
//! It never writes to its parent until it is committed; dropping it discards every change.

use bourse_models::{
    AccountId, AccountRecord, Address, AssetId, AssetRecord, BalanceId, BalanceRecord,
    CollateralRecord, FeedIndex, FeedRecord, GameId, GameRecord, MarketIndexKey, ObjectId,
    ObjectRecord, OrderKind, OrderRecord, PropertyId, PropertyRecord, SlotIndex, SlotRecord,
};
use bourse_state_exports::{
    get_or_else, Applicable, ChainState, SetOrDelete, SetOrKeep, StateChanges,
};
use bourse_time::BourseTime;
use std::collections::BTreeMap;

/// Copy-on-write layer over any `ChainState`, including another `PendingState`
pub struct PendingState<'a> {
    parent: &'a mut dyn ChainState,

    /// changes written to this layer since its creation
    changes: StateChanges,
}

/// Finds a record by a secondary key, looking at this layer first.
///
/// A parent record whose primary key was touched by the layer is shadowed: the layer
/// either deleted it or rewrote it with a different secondary key.
fn find_by<K, V, M, P, F>(
    changes: &BTreeMap<K, SetOrDelete<V>>,
    matches: M,
    primary_key: P,
    parent: F,
) -> Option<V>
where
    K: Ord,
    V: Clone,
    M: Fn(&V) -> bool,
    P: Fn(&V) -> K,
    F: FnOnce() -> Option<V>,
{
    let local = changes
        .values()
        .filter_map(|change| change.as_option())
        .find(|record| matches(record));
    if let Some(record) = local {
        return Some(record.clone());
    }
    let record = parent()?;
    if changes.contains_key(&primary_key(&record)) {
        None
    } else {
        Some(record)
    }
}

impl<'a> PendingState<'a> {
    /// Creates an empty layer over `parent`
    pub fn new(parent: &'a mut dyn ChainState) -> Self {
        PendingState {
            parent,
            changes: StateChanges::default(),
        }
    }

    /// Changes written so far
    pub fn changes(&self) -> &StateChanges {
        &self.changes
    }

    /// Takes a snapshot (clone) of the changes written so far
    pub fn get_snapshot(&self) -> StateChanges {
        self.changes.clone()
    }

    /// Resets the layer to a snapshot (see `get_snapshot` method)
    pub fn reset_to_snapshot(&mut self, snapshot: StateChanges) {
        self.changes = snapshot;
    }

    /// Returns the changes written so far and resets the layer to empty
    pub fn take(&mut self) -> StateChanges {
        std::mem::take(&mut self.changes)
    }

    /// Overrides the chain time seen through this layer
    pub fn set_now(&mut self, now: BourseTime) {
        self.changes.now = SetOrKeep::Set(now);
    }

    /// Applies every change of the layer to its parent
    pub fn commit(self) {
        let PendingState { parent, changes } = self;
        parent.apply_changes(changes);
    }
}

impl<'a> ChainState for PendingState<'a> {
    fn now(&self) -> BourseTime {
        match &self.changes.now {
            SetOrKeep::Set(now) => *now,
            SetOrKeep::Keep => self.parent.now(),
        }
    }

    fn get_property(&self, id: PropertyId) -> Option<PropertyRecord> {
        get_or_else(&self.changes.properties, &id, || self.parent.get_property(id))
    }

    fn store_property(&mut self, record: PropertyRecord) {
        self.changes
            .properties
            .insert(record.id, SetOrDelete::Set(record));
    }

    fn get_account_by_id(&self, id: AccountId) -> Option<AccountRecord> {
        get_or_else(&self.changes.accounts, &id, || {
            self.parent.get_account_by_id(id)
        })
    }

    fn get_account_by_name(&self, name: &str) -> Option<AccountRecord> {
        find_by(
            &self.changes.accounts,
            |record| record.name == name,
            |record| record.id,
            || self.parent.get_account_by_name(name),
        )
    }

    fn get_account_by_address(&self, address: &Address) -> Option<AccountRecord> {
        find_by(
            &self.changes.accounts,
            |record| record.owner_address == *address,
            |record| record.id,
            || self.parent.get_account_by_address(address),
        )
    }

    fn store_account(&mut self, record: AccountRecord) {
        self.changes
            .accounts
            .insert(record.id, SetOrDelete::Set(record));
    }

    fn get_asset_by_id(&self, id: AssetId) -> Option<AssetRecord> {
        get_or_else(&self.changes.assets, &id, || self.parent.get_asset_by_id(id))
    }

    fn get_asset_by_symbol(&self, symbol: &str) -> Option<AssetRecord> {
        find_by(
            &self.changes.assets,
            |record| record.symbol == symbol,
            |record| record.id,
            || self.parent.get_asset_by_symbol(symbol),
        )
    }

    fn store_asset(&mut self, record: AssetRecord) {
        self.changes
            .assets
            .insert(record.id, SetOrDelete::Set(record));
    }

    fn get_balance(&self, id: &BalanceId) -> Option<BalanceRecord> {
        get_or_else(&self.changes.balances, id, || self.parent.get_balance(id))
    }

    fn store_balance(&mut self, id: BalanceId, record: BalanceRecord) {
        self.changes.balances.insert(id, SetOrDelete::Set(record));
    }

    fn get_feed(&self, index: &FeedIndex) -> Option<FeedRecord> {
        get_or_else(&self.changes.feeds, index, || self.parent.get_feed(index))
    }

    fn store_feed(&mut self, record: FeedRecord) {
        self.changes
            .feeds
            .insert(record.index, SetOrDelete::Set(record));
    }

    fn get_slot(&self, index: &SlotIndex) -> Option<SlotRecord> {
        get_or_else(&self.changes.slots, index, || self.parent.get_slot(index))
    }

    fn store_slot(&mut self, record: SlotRecord) {
        self.changes
            .slots
            .insert(record.index, SetOrDelete::Set(record));
    }

    fn get_game_by_id(&self, id: GameId) -> Option<GameRecord> {
        get_or_else(&self.changes.games, &id, || self.parent.get_game_by_id(id))
    }

    fn get_game_by_name(&self, name: &str) -> Option<GameRecord> {
        find_by(
            &self.changes.games,
            |record| record.name == name,
            |record| record.id,
            || self.parent.get_game_by_name(name),
        )
    }

    fn store_game(&mut self, record: GameRecord) {
        self.changes
            .games
            .insert(record.id, SetOrDelete::Set(record));
    }

    fn get_object(&self, id: ObjectId) -> Option<ObjectRecord> {
        get_or_else(&self.changes.objects, &id, || self.parent.get_object(id))
    }

    fn store_object(&mut self, record: ObjectRecord) {
        self.changes
            .objects
            .insert(record.id, SetOrDelete::Set(record));
    }

    fn get_order(&self, kind: OrderKind, index: &MarketIndexKey) -> Option<OrderRecord> {
        get_or_else(&self.changes.orders, &(kind, *index), || {
            self.parent.get_order(kind, index)
        })
    }

    fn store_order(&mut self, kind: OrderKind, index: MarketIndexKey, record: OrderRecord) {
        let change = if record.is_null() {
            SetOrDelete::Delete
        } else {
            SetOrDelete::Set(record)
        };
        self.changes.orders.insert((kind, index), change);
    }

    fn get_collateral(&self, index: &MarketIndexKey) -> Option<CollateralRecord> {
        get_or_else(&self.changes.collaterals, index, || {
            self.parent.get_collateral(index)
        })
    }

    fn store_collateral(&mut self, index: MarketIndexKey, record: CollateralRecord) {
        let change = if record.is_null() {
            SetOrDelete::Delete
        } else {
            SetOrDelete::Set(record)
        };
        self.changes.collaterals.insert(index, change);
    }

    fn apply_changes(&mut self, changes: StateChanges) {
        self.changes.apply(changes);
    }
}
