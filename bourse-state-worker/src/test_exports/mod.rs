// Copyright (c) 2024 BOURSE LABS

//! Genesis tooling for tests: builds a `BaseState` holding the core asset plus
//! whatever accounts, assets, games, balances and orders a scenario needs.

use crate::BaseState;
use bourse_hash::Hash;
use bourse_models::config::constants::{
    BASE_ASSET_ID, BASE_ASSET_SYMBOL, BLOCKCHAIN_PRECISION, DATABASE_VERSION, MAX_SHARES,
};
use bourse_models::{
    AccountId, AccountRecord, Address, Asset, AssetId, AssetIssuer, AssetRecord, BalanceRecord,
    CollateralRecord, GameId, GameRecord, MarketIndexKey, MultisigCondition, ObjectId,
    ObjectKind, ObjectRecord, OrderKind, OrderRecord, PropertyId, ShareAmount,
    WithdrawCondition,
};
use bourse_state_exports::{ChainState, ChainStateExt};
use bourse_time::BourseTime;

/// Builds a genesis state
pub struct GenesisBuilder {
    state: BaseState,
}

fn asset_record(
    id: AssetId,
    symbol: &str,
    issuer: AssetIssuer,
    authority: MultisigCondition,
    precision: u64,
    max_supply: ShareAmount,
    now: BourseTime,
) -> AssetRecord {
    AssetRecord {
        id,
        symbol: symbol.to_string(),
        name: symbol.to_lowercase(),
        description: String::new(),
        public_data: serde_json::Value::Null,
        issuer,
        authority,
        precision,
        max_supply,
        current_supply: 0,
        current_collateral: 0,
        collected_fees: 0,
        withdrawal_fee: 0,
        market_fee_rate: 0,
        active_flags: Default::default(),
        authority_flag_permissions: Default::default(),
        whitelist: Default::default(),
        registration_date: now,
        last_update: now,
    }
}

impl GenesisBuilder {
    /// Genesis holding only the core asset, at chain time `now`
    pub fn new(now: BourseTime) -> Self {
        let mut state = BaseState::new(now);
        state
            .set_typed_property(PropertyId::DatabaseVersion, &DATABASE_VERSION)
            .expect("database version is serializable");
        state
            .set_typed_property(
                PropertyId::ChainId,
                &Hash::compute_from(b"bourse test chain"),
            )
            .expect("chain id is serializable");
        state.store_asset(asset_record(
            BASE_ASSET_ID,
            BASE_ASSET_SYMBOL,
            AssetIssuer::Genesis,
            MultisigCondition::default(),
            BLOCKCHAIN_PRECISION as u64,
            MAX_SHARES,
            now,
        ));
        GenesisBuilder { state }
    }

    /// Registers an account, its name must be unique
    pub fn account(&mut self, name: &str, owner: Address, active: Address) -> AccountId {
        let id = self
            .state
            .new_account_id()
            .expect("account id space not exhausted");
        let now = self.state.now();
        self.state.store_account(AccountRecord {
            id,
            name: name.to_string(),
            public_data: serde_json::Value::Null,
            owner_address: owner,
            active_address: active,
            registration_date: now,
            last_update: now,
        });
        id
    }

    /// Registers an asset issued by `issuer`, controlled by its active key
    pub fn user_asset(
        &mut self,
        symbol: &str,
        issuer: AccountId,
        max_supply: ShareAmount,
        precision: u64,
    ) -> AssetId {
        let account = self
            .state
            .get_account_by_id(issuer)
            .expect("issuer account registered first");
        self.new_asset(
            symbol,
            AssetIssuer::User(issuer),
            MultisigCondition::single(account.active_key()),
            precision,
            max_supply,
        )
    }

    /// Registers an asset whose supply comes from short and cover trading
    pub fn market_asset(&mut self, symbol: &str) -> AssetId {
        self.new_asset(
            symbol,
            AssetIssuer::Market,
            MultisigCondition::default(),
            BLOCKCHAIN_PRECISION as u64,
            MAX_SHARES,
        )
    }

    /// Registers a game owned by `owner`
    pub fn game(&mut self, name: &str, owner: AccountId) -> GameId {
        let id = self
            .state
            .new_game_id()
            .expect("game id space not exhausted");
        let now = self.state.now();
        self.state.store_game(GameRecord {
            id,
            name: name.to_string(),
            description: String::new(),
            owner_account_id: owner,
            asset_id: None,
            registration_date: now,
            last_update: now,
        });
        id
    }

    /// Registers the chip asset of `game`, with `supply` chips backed by `collateral` core shares
    pub fn chip_asset(
        &mut self,
        symbol: &str,
        game: GameId,
        supply: ShareAmount,
        collateral: ShareAmount,
    ) -> AssetId {
        let mut game_record = self
            .state
            .get_game_by_id(game)
            .expect("game registered first");
        let id = self.new_asset(
            symbol,
            AssetIssuer::Game(game),
            MultisigCondition::default(),
            BLOCKCHAIN_PRECISION as u64,
            MAX_SHARES,
        );
        self.update_asset(id, |record| {
            record.current_supply = supply;
            record.current_collateral = collateral;
        });
        game_record.asset_id = Some(id);
        self.state.store_game(game_record);
        id
    }

    /// Registers a generic object
    pub fn object(&mut self, kind: ObjectKind) -> ObjectId {
        let id = self
            .state
            .new_object_id()
            .expect("object id space not exhausted");
        self.state.store_object(ObjectRecord {
            id,
            kind,
            public_data: serde_json::Value::Null,
        });
        id
    }

    /// Mutates an already registered asset
    pub fn update_asset<F: FnOnce(&mut AssetRecord)>(&mut self, id: AssetId, f: F) {
        let mut record = self
            .state
            .get_asset_by_id(id)
            .expect("asset registered first");
        f(&mut record);
        self.state.store_asset(record);
    }

    /// Credits a balance record
    pub fn balance(&mut self, condition: WithdrawCondition, amount: Asset) {
        let id = condition
            .balance_id(amount.asset_id)
            .expect("condition is serializable");
        let mut record = self
            .state
            .get_balance(&id)
            .unwrap_or_else(|| BalanceRecord::new(condition, amount.asset_id));
        record.balance += amount.amount;
        record.last_update = self.state.now();
        self.state.store_balance(id, record);
    }

    /// Places a resting order
    pub fn order(&mut self, kind: OrderKind, index: MarketIndexKey, balance: ShareAmount) {
        let now = self.state.now();
        self.state.store_order(
            kind,
            index,
            OrderRecord {
                balance,
                limit_price: None,
                last_update: now,
            },
        );
    }

    /// Opens a margin position
    pub fn position(&mut self, index: MarketIndexKey, position: CollateralRecord) {
        self.state.store_collateral(index, position);
    }

    /// The genesis state
    pub fn build(self) -> BaseState {
        self.state
    }

    fn new_asset(
        &mut self,
        symbol: &str,
        issuer: AssetIssuer,
        authority: MultisigCondition,
        precision: u64,
        max_supply: ShareAmount,
    ) -> AssetId {
        let id = self
            .state
            .new_asset_id()
            .expect("asset id space not exhausted");
        let now = self.state.now();
        self.state.store_asset(asset_record(
            id, symbol, issuer, authority, precision, max_supply, now,
        ));
        id
    }
}
