// Copyright (c) 2024 BOURSE LABS

//! Changes accumulated by a pending state layer, applied in one go to its parent

use crate::types::{Applicable, SetOrDelete, SetOrKeep};
use bourse_models::{
    AccountId, AccountRecord, AssetId, AssetRecord, BalanceId, BalanceRecord, CollateralRecord,
    FeedIndex, FeedRecord, GameId, GameRecord, MarketIndexKey, ObjectId, ObjectRecord, OrderKind,
    OrderRecord, PropertyId, PropertyRecord, SlotIndex, SlotRecord,
};
use bourse_time::BourseTime;
use std::collections::BTreeMap;

/// Every record written or deleted since a layer was created
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct StateChanges {
    /// new chain time, set when a block is applied
    pub now: SetOrKeep<BourseTime>,
    #[allow(missing_docs)]
    pub properties: BTreeMap<PropertyId, SetOrDelete<PropertyRecord>>,
    #[allow(missing_docs)]
    pub accounts: BTreeMap<AccountId, SetOrDelete<AccountRecord>>,
    #[allow(missing_docs)]
    pub assets: BTreeMap<AssetId, SetOrDelete<AssetRecord>>,
    #[allow(missing_docs)]
    pub balances: BTreeMap<BalanceId, SetOrDelete<BalanceRecord>>,
    #[allow(missing_docs)]
    pub feeds: BTreeMap<FeedIndex, SetOrDelete<FeedRecord>>,
    #[allow(missing_docs)]
    pub slots: BTreeMap<SlotIndex, SetOrDelete<SlotRecord>>,
    #[allow(missing_docs)]
    pub games: BTreeMap<GameId, SetOrDelete<GameRecord>>,
    #[allow(missing_docs)]
    pub objects: BTreeMap<ObjectId, SetOrDelete<ObjectRecord>>,
    /// resting orders, a null record is stored as a deletion
    pub orders: BTreeMap<(OrderKind, MarketIndexKey), SetOrDelete<OrderRecord>>,
    /// margin positions, a null record is stored as a deletion
    pub collaterals: BTreeMap<MarketIndexKey, SetOrDelete<CollateralRecord>>,
}

/// Looks a key up in a change map, falling back to `f` when the layer did not touch it
pub fn get_or_else<K: Ord, V: Clone, F: FnOnce() -> Option<V>>(
    changes: &BTreeMap<K, SetOrDelete<V>>,
    key: &K,
    f: F,
) -> Option<V> {
    match changes.get(key) {
        Some(change) => change.as_option().cloned(),
        None => f(),
    }
}

fn merge<K: Ord, V: Clone>(
    into: &mut BTreeMap<K, SetOrDelete<V>>,
    from: BTreeMap<K, SetOrDelete<V>>,
) {
    for (key, change) in from {
        match into.get_mut(&key) {
            Some(current) => current.apply(change),
            None => {
                into.insert(key, change);
            }
        }
    }
}

impl StateChanges {
    /// Whether no record was touched
    pub fn is_empty(&self) -> bool {
        matches!(self.now, SetOrKeep::Keep)
            && self.properties.is_empty()
            && self.accounts.is_empty()
            && self.assets.is_empty()
            && self.balances.is_empty()
            && self.feeds.is_empty()
            && self.slots.is_empty()
            && self.games.is_empty()
            && self.objects.is_empty()
            && self.orders.is_empty()
            && self.collaterals.is_empty()
    }
}

/// Stacking: the changes of a child layer override those of its parent
impl Applicable<StateChanges> for StateChanges {
    fn apply(&mut self, changes: StateChanges) {
        self.now.apply(changes.now);
        merge(&mut self.properties, changes.properties);
        merge(&mut self.accounts, changes.accounts);
        merge(&mut self.assets, changes.assets);
        merge(&mut self.balances, changes.balances);
        merge(&mut self.feeds, changes.feeds);
        merge(&mut self.slots, changes.slots);
        merge(&mut self.games, changes.games);
        merge(&mut self.objects, changes.objects);
        merge(&mut self.orders, changes.orders);
        merge(&mut self.collaterals, changes.collaterals);
    }
}
