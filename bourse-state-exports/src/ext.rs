// Copyright (c) 2024 BOURSE LABS

//! Typed helpers every `ChainState` gets for free

use crate::{ChainState, StateError};
use bourse_hash::Hash;
use bourse_logging::bourse_trace;
use bourse_models::amount::{format_share_amount, parse_share_amount};
use bourse_models::config::constants::NUM_DELEGATES;
use bourse_models::{
    AccountId, Asset, AssetId, AssetIssuer, GameId, MultisigCondition, ObjectId, ObjectKind,
    PropertyId, PropertyRecord,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;

/// Markets as `(quote, base)` pairs
pub type MarketSet = BTreeSet<(AssetId, AssetId)>;

/// Property accessors, identifier allocators, display conversions and ownership resolution
pub trait ChainStateExt: ChainState {
    /// Decodes a property, `None` when it was never set
    fn get_typed_property<T: DeserializeOwned>(
        &self,
        id: PropertyId,
    ) -> Result<Option<T>, StateError> {
        self.get_property(id)
            .map(|record| {
                serde_json::from_value(record.value)
                    .map_err(|err| StateError::PropertyDecodeError(id, err.to_string()))
            })
            .transpose()
    }

    /// Encodes and stores a property
    fn set_typed_property<T: Serialize>(
        &mut self,
        id: PropertyId,
        value: &T,
    ) -> Result<(), StateError> {
        let value = serde_json::to_value(value)
            .map_err(|err| StateError::PropertyDecodeError(id, err.to_string()))?;
        self.store_property(PropertyRecord { id, value });
        Ok(())
    }

    #[allow(missing_docs)]
    fn chain_id(&self) -> Result<Option<Hash>, StateError> {
        self.get_typed_property(PropertyId::ChainId)
    }

    #[allow(missing_docs)]
    fn database_version(&self) -> Result<Option<u64>, StateError> {
        self.get_typed_property(PropertyId::DatabaseVersion)
    }

    /// Statistics are off unless enabled at genesis
    fn statistics_enabled(&self) -> Result<bool, StateError> {
        Ok(self
            .get_typed_property(PropertyId::StatisticsEnabled)?
            .unwrap_or(false))
    }

    /// Confirmations a block needs, three rounds of delegates unless configured
    fn required_confirmations(&self) -> Result<u64, StateError> {
        Ok(self
            .get_typed_property(PropertyId::ConfirmationRequirement)?
            .unwrap_or(3 * u64::from(NUM_DELEGATES)))
    }

    #[allow(missing_docs)]
    fn active_delegate_list(&self) -> Result<Vec<AccountId>, StateError> {
        Ok(self
            .get_typed_property(PropertyId::ActiveDelegateListId)?
            .unwrap_or_default())
    }

    #[allow(missing_docs)]
    fn last_random_seed(&self) -> Result<Option<Hash>, StateError> {
        self.get_typed_property(PropertyId::LastRandomSeedId)
    }

    /// Markets touched since the last matching pass
    fn dirty_markets(&self) -> Result<MarketSet, StateError> {
        Ok(self
            .get_typed_property(PropertyId::DirtyMarkets)?
            .unwrap_or_default())
    }

    /// Flags a market for matching
    fn mark_market_dirty(&mut self, quote_id: AssetId, base_id: AssetId) -> Result<(), StateError> {
        let mut markets = self.dirty_markets()?;
        if markets.insert((quote_id, base_id)) {
            self.set_typed_property(PropertyId::DirtyMarkets, &markets)?;
        }
        Ok(())
    }

    #[allow(missing_docs)]
    fn last_asset_id(&self) -> Result<AssetId, StateError> {
        Ok(self
            .get_typed_property(PropertyId::LastAssetId)?
            .unwrap_or_default())
    }

    /// Allocates the next asset identifier
    fn new_asset_id(&mut self) -> Result<AssetId, StateError> {
        allocate_id(self, PropertyId::LastAssetId)
    }

    #[allow(missing_docs)]
    fn last_account_id(&self) -> Result<AccountId, StateError> {
        Ok(self
            .get_typed_property(PropertyId::LastAccountId)?
            .unwrap_or_default())
    }

    /// Allocates the next account identifier
    fn new_account_id(&mut self) -> Result<AccountId, StateError> {
        allocate_id(self, PropertyId::LastAccountId)
    }

    /// Allocates the next game identifier
    fn new_game_id(&mut self) -> Result<GameId, StateError> {
        allocate_id(self, PropertyId::LastGameId)
    }

    /// Allocates the next object identifier
    fn new_object_id(&mut self) -> Result<ObjectId, StateError> {
        allocate_id(self, PropertyId::LastObjectId)
    }

    /// Renders an amount with the symbol and precision of its asset
    fn to_pretty_asset(&self, amount: Asset) -> Result<String, StateError> {
        let record = self
            .get_asset_by_id(amount.asset_id)
            .ok_or(StateError::UnknownAsset(amount.asset_id))?;
        Ok(format_share_amount(
            amount.amount,
            record.precision,
            &record.symbol,
        )?)
    }

    /// Parses a decimal amount of the asset named `symbol`
    fn to_ugly_asset(&self, amount: &str, symbol: &str) -> Result<Asset, StateError> {
        let record = self
            .get_asset_by_symbol(symbol)
            .ok_or_else(|| StateError::UnknownSymbol(symbol.to_string()))?;
        Ok(Asset::new(
            parse_share_amount(amount, record.precision)?,
            record.id,
        ))
    }

    /// Resolves who controls an object by walking its ownership chain.
    ///
    /// Fails when the chain visits an object twice or is longer than `max_depth`.
    fn get_object_condition(
        &self,
        id: ObjectId,
        max_depth: usize,
    ) -> Result<MultisigCondition, StateError> {
        let mut visited = BTreeSet::new();
        let mut current = id;
        loop {
            if !visited.insert(current) {
                return Err(StateError::CircularOwnership(id));
            }
            if visited.len() > max_depth {
                return Err(StateError::OwnershipTooDeep(id, max_depth));
            }
            let object = self
                .get_object(current)
                .ok_or(StateError::UnknownObject(current))?;
            let account_id = match object.kind {
                ObjectKind::Base {
                    owner_object,
                    owners,
                } => {
                    if owner_object == current {
                        return Ok(owners);
                    }
                    current = owner_object;
                    continue;
                }
                ObjectKind::Edge { from, .. } => {
                    current = from;
                    continue;
                }
                ObjectKind::Account(account_id) => account_id,
                ObjectKind::Asset(asset_id) => {
                    let asset = self
                        .get_asset_by_id(asset_id)
                        .ok_or(StateError::UnknownAsset(asset_id))?;
                    match asset.issuer {
                        AssetIssuer::User(account_id) => account_id,
                        _ => return Err(StateError::NoOwnerCondition(current)),
                    }
                }
            };
            let account = self
                .get_account_by_id(account_id)
                .ok_or(StateError::UnknownAccount(account_id))?;
            return Ok(MultisigCondition::single(account.owner_address));
        }
    }
}

impl<S: ChainState + ?Sized> ChainStateExt for S {}

fn allocate_id<S, T>(state: &mut S, property: PropertyId) -> Result<T, StateError>
where
    S: ChainState + ?Sized,
    T: DeserializeOwned + Serialize + Default + TryFrom<u64> + Into<u64>,
{
    let last: T = state.get_typed_property(property)?.unwrap_or_default();
    let next_id = Into::<u64>::into(last)
        .checked_add(1)
        .ok_or(StateError::IdOverflow(property))?;
    let next = T::try_from(next_id).map_err(|_| StateError::IdOverflow(property))?;
    state.set_typed_property(property, &next)?;
    bourse_trace!("state.allocate_id", { "property": format!("{:?}", property), "id": next_id });
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockChainState;
    use assert_matches::assert_matches;
    use bourse_models::{AccountRecord, Address, AssetRecord, ObjectRecord};
    use mockall::predicate::eq;
    use serde_json::json;

    fn property(id: PropertyId, value: serde_json::Value) -> Option<PropertyRecord> {
        Some(PropertyRecord { id, value })
    }

    fn account(id: AccountId, owner: &[u8]) -> AccountRecord {
        AccountRecord {
            id,
            name: "alice".to_string(),
            public_data: serde_json::Value::Null,
            owner_address: Address::from_public_key_bytes(owner),
            active_address: Address::from_public_key_bytes(b"active"),
            registration_date: Default::default(),
            last_update: Default::default(),
        }
    }

    fn object(id: ObjectId, kind: ObjectKind) -> Option<ObjectRecord> {
        Some(ObjectRecord {
            id,
            kind,
            public_data: serde_json::Value::Null,
        })
    }

    #[test]
    fn test_new_asset_id_increments_last_id() {
        let mut state = MockChainState::new();
        state
            .expect_get_property()
            .with(eq(PropertyId::LastAssetId))
            .returning(|id| property(id, json!(4)));
        state
            .expect_store_property()
            .withf(|record| record.id == PropertyId::LastAssetId && record.value == json!(5))
            .times(1)
            .return_const(());
        assert_eq!(state.new_asset_id().unwrap(), 5);
    }

    #[test]
    fn test_first_object_id_is_one() {
        let mut state = MockChainState::new();
        state.expect_get_property().returning(|_| None);
        state
            .expect_store_property()
            .withf(|record| record.id == PropertyId::LastObjectId && record.value == json!(1))
            .times(1)
            .return_const(());
        assert_eq!(state.new_object_id().unwrap(), 1);
    }

    #[test]
    fn test_id_space_exhaustion() {
        let mut state = MockChainState::new();
        state
            .expect_get_property()
            .returning(|id| property(id, json!(u32::MAX)));
        assert_matches!(
            state.new_account_id(),
            Err(StateError::IdOverflow(PropertyId::LastAccountId))
        );
    }

    #[test]
    fn test_property_defaults_and_decoding() {
        let mut state = MockChainState::new();
        state
            .expect_get_property()
            .with(eq(PropertyId::ConfirmationRequirement))
            .returning(|_| None);
        state
            .expect_get_property()
            .with(eq(PropertyId::StatisticsEnabled))
            .returning(|id| property(id, json!("yes")));
        assert_eq!(
            state.required_confirmations().unwrap(),
            3 * u64::from(NUM_DELEGATES)
        );
        assert_matches!(
            state.statistics_enabled(),
            Err(StateError::PropertyDecodeError(
                PropertyId::StatisticsEnabled,
                _
            ))
        );
    }

    #[test]
    fn test_pretty_and_ugly_assets() {
        let mut state = MockChainState::new();
        let record = AssetRecord {
            id: 3,
            symbol: "XYZ".to_string(),
            name: "xyz".to_string(),
            description: String::new(),
            public_data: serde_json::Value::Null,
            issuer: AssetIssuer::User(1),
            authority: MultisigCondition::default(),
            precision: 100_000,
            max_supply: 1_000_000_000,
            current_supply: 0,
            current_collateral: 0,
            collected_fees: 0,
            withdrawal_fee: 0,
            market_fee_rate: 0,
            active_flags: Default::default(),
            authority_flag_permissions: Default::default(),
            whitelist: Default::default(),
            registration_date: Default::default(),
            last_update: Default::default(),
        };
        let by_id = record.clone();
        state
            .expect_get_asset_by_id()
            .with(eq(3))
            .returning(move |_| Some(by_id.clone()));
        state
            .expect_get_asset_by_symbol()
            .returning(move |symbol| (symbol == "XYZ").then(|| record.clone()));

        assert_eq!(
            state.to_pretty_asset(Asset::new(123_450_000, 3)).unwrap(),
            "1,234.50000 XYZ"
        );
        assert_eq!(
            state.to_ugly_asset("1,234.5", "XYZ").unwrap(),
            Asset::new(123_450_000, 3)
        );
        assert_matches!(
            state.to_ugly_asset("1", "ABC"),
            Err(StateError::UnknownSymbol(_))
        );
    }

    #[test]
    fn test_object_condition_follows_edges_and_bases() {
        let mut state = MockChainState::new();
        let owners = MultisigCondition::single(Address::from_public_key_bytes(b"bob"));
        let expected = owners.clone();
        state.expect_get_object().returning(move |id| match id {
            1 => object(
                1,
                ObjectKind::Edge {
                    from: 2,
                    to: 9,
                    name: "likes".to_string(),
                },
            ),
            2 => object(
                2,
                ObjectKind::Base {
                    owner_object: 3,
                    owners: MultisigCondition::default(),
                },
            ),
            3 => object(
                3,
                ObjectKind::Base {
                    owner_object: 3,
                    owners: owners.clone(),
                },
            ),
            4 => object(4, ObjectKind::Account(7)),
            _ => None,
        });
        state
            .expect_get_account_by_id()
            .with(eq(7))
            .returning(|id| Some(account(id, b"carol")));

        assert_eq!(state.get_object_condition(1, 8).unwrap(), expected);
        assert_eq!(
            state.get_object_condition(4, 8).unwrap(),
            MultisigCondition::single(Address::from_public_key_bytes(b"carol"))
        );
        assert_matches!(
            state.get_object_condition(1, 2),
            Err(StateError::OwnershipTooDeep(1, 2))
        );
        assert_matches!(
            state.get_object_condition(5, 8),
            Err(StateError::UnknownObject(5))
        );
    }

    #[test]
    fn test_object_condition_detects_cycles() {
        let mut state = MockChainState::new();
        state.expect_get_object().returning(|id| {
            object(
                id,
                ObjectKind::Base {
                    owner_object: if id == 1 { 2 } else { 1 },
                    owners: MultisigCondition::default(),
                },
            )
        });
        assert_matches!(
            state.get_object_condition(1, 8),
            Err(StateError::CircularOwnership(1))
        );
    }

    #[test]
    fn test_market_issued_asset_object_has_no_owner() {
        let mut state = MockChainState::new();
        state
            .expect_get_object()
            .returning(|id| object(id, ObjectKind::Asset(0)));
        state.expect_get_asset_by_id().returning(|id| {
            Some(AssetRecord {
                id,
                symbol: "USD".to_string(),
                name: "usd".to_string(),
                description: String::new(),
                public_data: serde_json::Value::Null,
                issuer: AssetIssuer::Market,
                authority: MultisigCondition::default(),
                precision: 1,
                max_supply: 1,
                current_supply: 0,
                current_collateral: 0,
                collected_fees: 0,
                withdrawal_fee: 0,
                market_fee_rate: 0,
                active_flags: Default::default(),
                authority_flag_permissions: Default::default(),
                whitelist: Default::default(),
                registration_date: Default::default(),
                last_update: Default::default(),
            })
        });
        assert_matches!(
            state.get_object_condition(6, 8),
            Err(StateError::NoOwnerCondition(6))
        );
    }
}
