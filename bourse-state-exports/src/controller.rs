// Copyright (c) 2024 BOURSE LABS

use crate::StateChanges;
use bourse_models::{
    AccountId, AccountRecord, Address, AssetId, AssetRecord, BalanceId, BalanceRecord,
    CollateralRecord, FeedIndex, FeedRecord, GameId, GameRecord, MarketIndexKey, ObjectId,
    ObjectRecord, OrderKind, OrderRecord, PropertyId, PropertyRecord, SlotIndex, SlotRecord,
};
use bourse_time::BourseTime;

/// Read and write access to the chain records.
///
/// Implemented by the committed state and by every pending layer stacked on top of it,
/// so rules can run unchanged against either. Getters return owned copies; writes are
/// only visible through the same accessor until its layer is committed.
#[cfg_attr(any(test, feature = "test-exports"), mockall::automock)]
pub trait ChainState: Send + Sync {
    /// Timestamp of the block being evaluated
    fn now(&self) -> BourseTime;

    /// Gets a chain property
    fn get_property(&self, id: PropertyId) -> Option<PropertyRecord>;

    /// Sets a chain property
    fn store_property(&mut self, record: PropertyRecord);

    /// Gets an account by identifier
    fn get_account_by_id(&self, id: AccountId) -> Option<AccountRecord>;

    /// Gets an account by its unique name
    fn get_account_by_name(&self, name: &str) -> Option<AccountRecord>;

    /// Gets the account whose owner key is `address`
    fn get_account_by_address(&self, address: &Address) -> Option<AccountRecord>;

    /// Creates or replaces an account
    fn store_account(&mut self, record: AccountRecord);

    /// Gets an asset by identifier
    fn get_asset_by_id(&self, id: AssetId) -> Option<AssetRecord>;

    /// Gets an asset by symbol
    fn get_asset_by_symbol(&self, symbol: &str) -> Option<AssetRecord>;

    /// Creates or replaces an asset
    fn store_asset(&mut self, record: AssetRecord);

    /// Gets a balance record
    fn get_balance(&self, id: &BalanceId) -> Option<BalanceRecord>;

    /// Creates or replaces a balance record, keyed by the identifier derived from its condition
    fn store_balance(&mut self, id: BalanceId, record: BalanceRecord);

    /// Gets a delegate feed
    fn get_feed(&self, index: &FeedIndex) -> Option<FeedRecord>;

    /// Creates or replaces a delegate feed
    fn store_feed(&mut self, record: FeedRecord);

    /// Gets a production slot
    fn get_slot(&self, index: &SlotIndex) -> Option<SlotRecord>;

    /// Creates or replaces a production slot
    fn store_slot(&mut self, record: SlotRecord);

    /// Gets a game by identifier
    fn get_game_by_id(&self, id: GameId) -> Option<GameRecord>;

    /// Gets a game by name
    fn get_game_by_name(&self, name: &str) -> Option<GameRecord>;

    /// Creates or replaces a game
    fn store_game(&mut self, record: GameRecord);

    /// Gets an object
    fn get_object(&self, id: ObjectId) -> Option<ObjectRecord>;

    /// Creates or replaces an object
    fn store_object(&mut self, record: ObjectRecord);

    /// Gets a resting order
    fn get_order(&self, kind: OrderKind, index: &MarketIndexKey) -> Option<OrderRecord>;

    /// Stores a resting order, a null record removes it from the book
    fn store_order(&mut self, kind: OrderKind, index: MarketIndexKey, record: OrderRecord);

    /// Gets a margin position
    fn get_collateral(&self, index: &MarketIndexKey) -> Option<CollateralRecord>;

    /// Stores a margin position, a null record removes it from the book
    fn store_collateral(&mut self, index: MarketIndexKey, record: CollateralRecord);

    /// Applies the changes of a committed child layer
    fn apply_changes(&mut self, changes: StateChanges);
}
