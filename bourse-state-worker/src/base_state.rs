// Copyright (c) 2024 BOURSE LABS

//! Committed chain records, kept in memory with the secondary indices lookups need

use bourse_models::{
    AccountId, AccountRecord, Address, AssetId, AssetRecord, BalanceId, BalanceRecord,
    CollateralRecord, FeedIndex, FeedRecord, GameId, GameRecord, MarketIndexKey, MarketOrder,
    ObjectId, ObjectRecord, OrderKind, OrderRecord, Price, PropertyId, PropertyRecord, SlotIndex,
    SlotRecord,
};
use bourse_state_exports::{ChainState, SetOrDelete, StateChanges};
use bourse_time::BourseTime;
use std::collections::BTreeMap;
use tracing::debug;

/// Committed state. Every pending layer eventually lands here.
#[derive(Debug, Default, Clone)]
pub struct BaseState {
    now: BourseTime,
    properties: BTreeMap<PropertyId, PropertyRecord>,
    accounts: BTreeMap<AccountId, AccountRecord>,
    account_names: BTreeMap<String, AccountId>,
    account_addresses: BTreeMap<Address, AccountId>,
    assets: BTreeMap<AssetId, AssetRecord>,
    asset_symbols: BTreeMap<String, AssetId>,
    balances: BTreeMap<BalanceId, BalanceRecord>,
    feeds: BTreeMap<FeedIndex, FeedRecord>,
    slots: BTreeMap<SlotIndex, SlotRecord>,
    games: BTreeMap<GameId, GameRecord>,
    game_names: BTreeMap<String, GameId>,
    objects: BTreeMap<ObjectId, ObjectRecord>,
    orders: BTreeMap<(OrderKind, MarketIndexKey), OrderRecord>,
    collaterals: BTreeMap<MarketIndexKey, CollateralRecord>,
}

/// Index keys spanning every owner of every price of one market
fn market_bounds(quote_id: AssetId, base_id: AssetId) -> (MarketIndexKey, MarketIndexKey) {
    (
        MarketIndexKey::new(
            Price::new(0, quote_id, base_id),
            Address::from_bytes(&[0; 32]),
        ),
        MarketIndexKey::new(
            Price::new(u128::MAX, quote_id, base_id),
            Address::from_bytes(&[u8::MAX; 32]),
        ),
    )
}

impl BaseState {
    /// Empty state at chain time `now`
    pub fn new(now: BourseTime) -> Self {
        BaseState {
            now,
            ..Default::default()
        }
    }

    /// Moves the chain clock, once per applied block
    pub fn set_now(&mut self, now: BourseTime) {
        self.now = now;
    }

    /// Resting orders of one book, lowest price first
    pub fn market_orders(
        &self,
        kind: OrderKind,
        quote_id: AssetId,
        base_id: AssetId,
    ) -> impl Iterator<Item = MarketOrder> + '_ {
        let (low, high) = market_bounds(quote_id, base_id);
        self.orders
            .range((kind, low)..=(kind, high))
            .map(|((kind, index), order)| MarketOrder::from_order(*kind, *index, order.clone()))
    }

    /// Margin positions of one market, lowest call price first
    pub fn market_positions(
        &self,
        quote_id: AssetId,
        base_id: AssetId,
    ) -> impl Iterator<Item = MarketOrder> + '_ {
        let (low, high) = market_bounds(quote_id, base_id);
        self.collaterals
            .range(low..=high)
            .map(|(index, position)| MarketOrder::from_collateral(*index, position))
    }

    fn remove_account(&mut self, id: AccountId) {
        if let Some(old) = self.accounts.remove(&id) {
            self.account_names.remove(&old.name);
            self.account_addresses.remove(&old.owner_address);
        }
    }

    fn remove_asset(&mut self, id: AssetId) {
        if let Some(old) = self.assets.remove(&id) {
            self.asset_symbols.remove(&old.symbol);
        }
    }

    fn remove_game(&mut self, id: GameId) {
        if let Some(old) = self.games.remove(&id) {
            self.game_names.remove(&old.name);
        }
    }
}

fn apply_map<K: Ord, V: Clone>(map: &mut BTreeMap<K, V>, changes: BTreeMap<K, SetOrDelete<V>>) {
    for (key, change) in changes {
        match change {
            SetOrDelete::Set(value) => {
                map.insert(key, value);
            }
            SetOrDelete::Delete => {
                map.remove(&key);
            }
        }
    }
}

impl ChainState for BaseState {
    fn now(&self) -> BourseTime {
        self.now
    }

    fn get_property(&self, id: PropertyId) -> Option<PropertyRecord> {
        self.properties.get(&id).cloned()
    }

    fn store_property(&mut self, record: PropertyRecord) {
        self.properties.insert(record.id, record);
    }

    fn get_account_by_id(&self, id: AccountId) -> Option<AccountRecord> {
        self.accounts.get(&id).cloned()
    }

    fn get_account_by_name(&self, name: &str) -> Option<AccountRecord> {
        self.account_names
            .get(name)
            .and_then(|id| self.get_account_by_id(*id))
    }

    fn get_account_by_address(&self, address: &Address) -> Option<AccountRecord> {
        self.account_addresses
            .get(address)
            .and_then(|id| self.get_account_by_id(*id))
    }

    fn store_account(&mut self, record: AccountRecord) {
        self.remove_account(record.id);
        self.account_names.insert(record.name.clone(), record.id);
        self.account_addresses
            .insert(record.owner_address, record.id);
        self.accounts.insert(record.id, record);
    }

    fn get_asset_by_id(&self, id: AssetId) -> Option<AssetRecord> {
        self.assets.get(&id).cloned()
    }

    fn get_asset_by_symbol(&self, symbol: &str) -> Option<AssetRecord> {
        self.asset_symbols
            .get(symbol)
            .and_then(|id| self.get_asset_by_id(*id))
    }

    fn store_asset(&mut self, record: AssetRecord) {
        self.remove_asset(record.id);
        self.asset_symbols.insert(record.symbol.clone(), record.id);
        self.assets.insert(record.id, record);
    }

    fn get_balance(&self, id: &BalanceId) -> Option<BalanceRecord> {
        self.balances.get(id).cloned()
    }

    fn store_balance(&mut self, id: BalanceId, record: BalanceRecord) {
        self.balances.insert(id, record);
    }

    fn get_feed(&self, index: &FeedIndex) -> Option<FeedRecord> {
        self.feeds.get(index).cloned()
    }

    fn store_feed(&mut self, record: FeedRecord) {
        self.feeds.insert(record.index, record);
    }

    fn get_slot(&self, index: &SlotIndex) -> Option<SlotRecord> {
        self.slots.get(index).cloned()
    }

    fn store_slot(&mut self, record: SlotRecord) {
        self.slots.insert(record.index, record);
    }

    fn get_game_by_id(&self, id: GameId) -> Option<GameRecord> {
        self.games.get(&id).cloned()
    }

    fn get_game_by_name(&self, name: &str) -> Option<GameRecord> {
        self.game_names
            .get(name)
            .and_then(|id| self.get_game_by_id(*id))
    }

    fn store_game(&mut self, record: GameRecord) {
        self.remove_game(record.id);
        self.game_names.insert(record.name.clone(), record.id);
        self.games.insert(record.id, record);
    }

    fn get_object(&self, id: ObjectId) -> Option<ObjectRecord> {
        self.objects.get(&id).cloned()
    }

    fn store_object(&mut self, record: ObjectRecord) {
        self.objects.insert(record.id, record);
    }

    fn get_order(&self, kind: OrderKind, index: &MarketIndexKey) -> Option<OrderRecord> {
        self.orders.get(&(kind, *index)).cloned()
    }

    fn store_order(&mut self, kind: OrderKind, index: MarketIndexKey, record: OrderRecord) {
        if record.is_null() {
            self.orders.remove(&(kind, index));
        } else {
            self.orders.insert((kind, index), record);
        }
    }

    fn get_collateral(&self, index: &MarketIndexKey) -> Option<CollateralRecord> {
        self.collaterals.get(index).cloned()
    }

    fn store_collateral(&mut self, index: MarketIndexKey, record: CollateralRecord) {
        if record.is_null() {
            self.collaterals.remove(&index);
        } else {
            self.collaterals.insert(index, record);
        }
    }

    fn apply_changes(&mut self, changes: StateChanges) {
        debug!(
            "applying changes: {} assets, {} balances, {} orders, {} positions",
            changes.assets.len(),
            changes.balances.len(),
            changes.orders.len(),
            changes.collaterals.len()
        );
        changes.now.apply_to(&mut self.now);
        apply_map(&mut self.properties, changes.properties);
        for (id, change) in changes.accounts {
            match change {
                SetOrDelete::Set(record) => self.store_account(record),
                SetOrDelete::Delete => self.remove_account(id),
            }
        }
        for (id, change) in changes.assets {
            match change {
                SetOrDelete::Set(record) => self.store_asset(record),
                SetOrDelete::Delete => self.remove_asset(id),
            }
        }
        apply_map(&mut self.balances, changes.balances);
        apply_map(&mut self.feeds, changes.feeds);
        apply_map(&mut self.slots, changes.slots);
        for (id, change) in changes.games {
            match change {
                SetOrDelete::Set(record) => self.store_game(record),
                SetOrDelete::Delete => self.remove_game(id),
            }
        }
        apply_map(&mut self.objects, changes.objects);
        apply_map(&mut self.orders, changes.orders);
        apply_map(&mut self.collaterals, changes.collaterals);
    }
}
