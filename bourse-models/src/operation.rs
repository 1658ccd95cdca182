// Copyright (c) 2024 BOURSE LABS

//! Operations: the typed actions a transaction is made of, and their binary encoding.
//!
//! Every operation is encoded as a `u32` varint tag followed by its fields.
//! Optional fields are prefixed by a presence byte, JSON values are carried as strings.

use crate::account::AccountId;
use crate::address::{Address, AddressDeserializer, AddressSerializer};
use crate::amount::{Asset, AssetAmountDeserializer, AssetAmountSerializer, ShareAmount};
use crate::asset::{
    AssetFlags, AssetFlagsDeserializer, AssetFlagsSerializer, AssetId, AssetIssuer,
    AssetIssuerDeserializer, AssetIssuerSerializer,
};
use crate::authority::{
    MultisigCondition, MultisigConditionDeserializer, MultisigConditionSerializer,
};
use crate::balance::{
    BalanceId, WithdrawCondition, WithdrawConditionDeserializer, WithdrawConditionSerializer,
};
use crate::config::constants::{MAX_CUSTOM_PAYLOAD_SIZE, MAX_NAME_DATA_SIZE, MAX_SYMBOL_SIZE};
use crate::market::{MarketIndexKey, MarketIndexKeyDeserializer, MarketIndexKeySerializer};
use crate::price::{Price, PriceDeserializer, PriceSerializer};
use bourse_serialization::{
    Deserializer, I64VarIntDeserializer, I64VarIntSerializer, OptionDeserializer,
    OptionSerializer, SerializeError, Serializer, StringDeserializer, StringSerializer,
    U16VarIntDeserializer, U16VarIntSerializer, U32VarIntDeserializer, U32VarIntSerializer,
    U64VarIntDeserializer, U64VarIntSerializer, VecU8Deserializer, VecU8Serializer,
};
use nom::error::{context, ContextError, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// Registers a new asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAssetOperation {
    /// ticker, `PARENT.SUB` for a hierarchical symbol
    pub symbol: String,
    #[allow(missing_docs)]
    pub name: String,
    #[allow(missing_docs)]
    pub description: String,
    #[allow(missing_docs)]
    pub public_data: serde_json::Value,
    /// user account or game issuing the asset
    pub issuer: AssetIssuer,
    #[allow(missing_docs)]
    pub max_supply: ShareAmount,
    /// power of ten
    pub precision: u64,
    /// shares credited to the transaction at creation
    pub initial_supply: ShareAmount,
    /// core asset shares debited from the transaction at creation
    pub initial_collateral: ShareAmount,
}

/// Where issued shares come from
#[derive(
    IntoPrimitive, TryFromPrimitive, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[repr(u32)]
pub enum IssueSource {
    /// new shares, bounded by the remaining supply headroom
    Supply = 0,
    /// shares taken out of the fees collected by the asset
    CollectedFees = 1,
}

/// Issues shares of a user issued asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueAssetOperation {
    #[allow(missing_docs)]
    pub asset_id: AssetId,
    /// strictly positive
    pub amount: ShareAmount,
    #[allow(missing_docs)]
    pub source: IssueSource,
}

/// Updates descriptive and economic attributes of an asset, absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUpdatePropertiesOperation {
    #[allow(missing_docs)]
    pub asset_id: AssetId,
    /// new issuing account
    pub issuer_account_id: Option<AccountId>,
    #[allow(missing_docs)]
    pub name: Option<String>,
    #[allow(missing_docs)]
    pub description: Option<String>,
    #[allow(missing_docs)]
    pub public_data: Option<serde_json::Value>,
    #[allow(missing_docs)]
    pub precision: Option<u64>,
    #[allow(missing_docs)]
    pub max_supply: Option<ShareAmount>,
    #[allow(missing_docs)]
    pub withdrawal_fee: Option<ShareAmount>,
    /// basis points
    pub market_fee_rate: Option<u16>,
}

impl AssetUpdatePropertiesOperation {
    /// Whether no field would change
    pub fn is_noop(&self) -> bool {
        self.issuer_account_id.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.public_data.is_none()
            && self.precision.is_none()
            && self.max_supply.is_none()
            && self.withdrawal_fee.is_none()
            && self.market_fee_rate.is_none()
    }
}

/// Updates the authority and flags of an asset, absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUpdatePermissionsOperation {
    #[allow(missing_docs)]
    pub asset_id: AssetId,
    #[allow(missing_docs)]
    pub authority: Option<MultisigCondition>,
    #[allow(missing_docs)]
    pub authority_flag_permissions: Option<AssetFlags>,
    #[allow(missing_docs)]
    pub active_flags: Option<AssetFlags>,
}

impl AssetUpdatePermissionsOperation {
    /// Whether no field would change
    pub fn is_noop(&self) -> bool {
        self.authority.is_none()
            && self.authority_flag_permissions.is_none()
            && self.active_flags.is_none()
    }
}

/// Whitelist mutation
#[derive(
    IntoPrimitive, TryFromPrimitive, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[repr(u32)]
pub enum WhitelistAction {
    #[allow(missing_docs)]
    Add = 0,
    #[allow(missing_docs)]
    Remove = 1,
}

/// Adds or removes one address of the whitelist of an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUpdateWhitelistOperation {
    #[allow(missing_docs)]
    pub asset_id: AssetId,
    #[allow(missing_docs)]
    pub action: WhitelistAction,
    #[allow(missing_docs)]
    pub address: Address,
}

/// Deposit into (positive amount) or withdrawal from (negative amount) a resting order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderOperation {
    #[allow(missing_docs)]
    pub amount: ShareAmount,
    #[allow(missing_docs)]
    pub index: MarketIndexKey,
}

/// Short order update, the index price is the interest rate offered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortOperation {
    #[allow(missing_docs)]
    pub amount: ShareAmount,
    #[allow(missing_docs)]
    pub index: MarketIndexKey,
    /// worst price the short may be filled at
    pub short_price_limit: Option<Price>,
}

/// Pays back the debt of a margin position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverOperation {
    /// quote asset paid, zero is allowed when only moving the call price
    pub amount: ShareAmount,
    /// position index, its price being the current call price
    pub index: MarketIndexKey,
    /// call price to use instead of the computed one, when higher
    pub new_cover_price: Option<Price>,
}

/// Exchange between chips of a game and the core asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipsOperation {
    /// account receiving the proceeds
    pub owner: Address,
    /// chips bought or sold
    pub amount: Asset,
}

/// Moves funds out of a balance record into the transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawOperation {
    #[allow(missing_docs)]
    pub balance_id: BalanceId,
    /// strictly positive
    pub amount: ShareAmount,
}

/// Moves funds out of the transaction into a balance record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositOperation {
    #[allow(missing_docs)]
    pub condition: WithdrawCondition,
    /// strictly positive, denominated in `asset_id`
    pub amount: ShareAmount,
    #[allow(missing_docs)]
    pub asset_id: AssetId,
}

/// The operation as found in a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    #[allow(missing_docs)]
    CreateAsset(CreateAssetOperation),
    #[allow(missing_docs)]
    IssueAsset(IssueAssetOperation),
    #[allow(missing_docs)]
    AssetUpdateProperties(AssetUpdatePropertiesOperation),
    #[allow(missing_docs)]
    AssetUpdatePermissions(AssetUpdatePermissionsOperation),
    #[allow(missing_docs)]
    AssetUpdateWhitelist(AssetUpdateWhitelistOperation),
    /// amount in quote asset
    Bid(OrderOperation),
    /// amount in base asset
    Ask(OrderOperation),
    /// amount in base asset
    Short(ShortOperation),
    /// amount in quote asset
    Cover(CoverOperation),
    /// amount in base asset
    AddCollateral(OrderOperation),
    /// reserved, always rejected
    RemoveCollateral(OrderOperation),
    #[allow(missing_docs)]
    BuyChips(ChipsOperation),
    #[allow(missing_docs)]
    SellChips(ChipsOperation),
    #[allow(missing_docs)]
    Withdraw(WithdrawOperation),
    #[allow(missing_docs)]
    Deposit(DepositOperation),
    /// operation defined by a registered evaluator
    Custom {
        /// registered evaluator tag
        type_id: u32,
        /// evaluator-defined encoding
        payload: Vec<u8>,
    },
}

#[derive(IntoPrimitive, Debug, Eq, PartialEq, TryFromPrimitive)]
#[repr(u32)]
enum OperationTypeId {
    CreateAsset = 0,
    IssueAsset = 1,
    AssetUpdateProperties = 2,
    AssetUpdatePermissions = 3,
    AssetUpdateWhitelist = 4,
    Bid = 5,
    Ask = 6,
    Short = 7,
    Cover = 8,
    AddCollateral = 9,
    RemoveCollateral = 10,
    BuyChips = 11,
    SellChips = 12,
    Withdraw = 13,
    Deposit = 14,
    Custom = 15,
}

impl OperationType {
    /// Short name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            OperationType::CreateAsset(_) => "create_asset",
            OperationType::IssueAsset(_) => "issue_asset",
            OperationType::AssetUpdateProperties(_) => "asset_update_properties",
            OperationType::AssetUpdatePermissions(_) => "asset_update_permissions",
            OperationType::AssetUpdateWhitelist(_) => "asset_update_whitelist",
            OperationType::Bid(_) => "bid",
            OperationType::Ask(_) => "ask",
            OperationType::Short(_) => "short",
            OperationType::Cover(_) => "cover",
            OperationType::AddCollateral(_) => "add_collateral",
            OperationType::RemoveCollateral(_) => "remove_collateral",
            OperationType::BuyChips(_) => "buy_chips",
            OperationType::SellChips(_) => "sell_chips",
            OperationType::Withdraw(_) => "withdraw",
            OperationType::Deposit(_) => "deposit",
            OperationType::Custom { .. } => "custom",
        }
    }
}

/// Serializer for `serde_json::Value`, carried as its compact JSON text
#[derive(Default, Clone)]
struct JsonValueSerializer {
    string_serializer: StringSerializer,
}

impl Serializer<serde_json::Value> for JsonValueSerializer {
    fn serialize(
        &self,
        value: &serde_json::Value,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.string_serializer.serialize(&value.to_string(), buffer)
    }
}

#[derive(Clone)]
struct JsonValueDeserializer {
    string_deserializer: StringDeserializer,
}

impl JsonValueDeserializer {
    const fn new() -> Self {
        Self {
            string_deserializer: StringDeserializer::new(MAX_NAME_DATA_SIZE),
        }
    }
}

impl Deserializer<serde_json::Value> for JsonValueDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], serde_json::Value, E> {
        context("Failed JSON value deserialization", |input| {
            let (rest, text) = self.string_deserializer.deserialize(input)?;
            let value = serde_json::from_str(&text).map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::Verify,
                ))
            })?;
            Ok((rest, value))
        })
        .parse(buffer)
    }
}

/// Serializer for `OperationType`
pub struct OperationTypeSerializer {
    u16_serializer: U16VarIntSerializer,
    u32_serializer: U32VarIntSerializer,
    u64_serializer: U64VarIntSerializer,
    i64_serializer: I64VarIntSerializer,
    string_serializer: StringSerializer,
    json_serializer: JsonValueSerializer,
    vec_u8_serializer: VecU8Serializer,
    address_serializer: AddressSerializer,
    asset_serializer: AssetAmountSerializer,
    issuer_serializer: AssetIssuerSerializer,
    price_serializer: PriceSerializer,
    index_serializer: MarketIndexKeySerializer,
    condition_serializer: WithdrawConditionSerializer,
    opt_u16_serializer: OptionSerializer<u16, U16VarIntSerializer>,
    opt_u32_serializer: OptionSerializer<u32, U32VarIntSerializer>,
    opt_u64_serializer: OptionSerializer<u64, U64VarIntSerializer>,
    opt_i64_serializer: OptionSerializer<i64, I64VarIntSerializer>,
    opt_string_serializer: OptionSerializer<String, StringSerializer>,
    opt_json_serializer: OptionSerializer<serde_json::Value, JsonValueSerializer>,
    opt_price_serializer: OptionSerializer<Price, PriceSerializer>,
    opt_multisig_serializer: OptionSerializer<MultisigCondition, MultisigConditionSerializer>,
    opt_flags_serializer: OptionSerializer<AssetFlags, AssetFlagsSerializer>,
}

impl OperationTypeSerializer {
    /// Creates a new `OperationTypeSerializer`
    pub fn new() -> Self {
        Self {
            u16_serializer: U16VarIntSerializer::new(),
            u32_serializer: U32VarIntSerializer::new(),
            u64_serializer: U64VarIntSerializer::new(),
            i64_serializer: I64VarIntSerializer::new(),
            string_serializer: StringSerializer::new(),
            json_serializer: JsonValueSerializer::default(),
            vec_u8_serializer: VecU8Serializer::new(),
            address_serializer: AddressSerializer::new(),
            asset_serializer: AssetAmountSerializer::new(),
            issuer_serializer: AssetIssuerSerializer::new(),
            price_serializer: PriceSerializer::new(),
            index_serializer: MarketIndexKeySerializer::new(),
            condition_serializer: WithdrawConditionSerializer::new(),
            opt_u16_serializer: OptionSerializer::new(U16VarIntSerializer::new()),
            opt_u32_serializer: OptionSerializer::new(U32VarIntSerializer::new()),
            opt_u64_serializer: OptionSerializer::new(U64VarIntSerializer::new()),
            opt_i64_serializer: OptionSerializer::new(I64VarIntSerializer::new()),
            opt_string_serializer: OptionSerializer::new(StringSerializer::new()),
            opt_json_serializer: OptionSerializer::new(JsonValueSerializer::default()),
            opt_price_serializer: OptionSerializer::new(PriceSerializer::new()),
            opt_multisig_serializer: OptionSerializer::new(MultisigConditionSerializer::new()),
            opt_flags_serializer: OptionSerializer::new(AssetFlagsSerializer::new()),
        }
    }

    fn serialize_order(
        &self,
        value: &OrderOperation,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.i64_serializer.serialize(&value.amount, buffer)?;
        self.index_serializer.serialize(&value.index, buffer)
    }
}

impl Default for OperationTypeSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<OperationType> for OperationTypeSerializer {
    fn serialize(&self, value: &OperationType, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        match value {
            OperationType::CreateAsset(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::CreateAsset), buffer)?;
                self.string_serializer.serialize(&op.symbol, buffer)?;
                self.string_serializer.serialize(&op.name, buffer)?;
                self.string_serializer.serialize(&op.description, buffer)?;
                self.json_serializer.serialize(&op.public_data, buffer)?;
                self.issuer_serializer.serialize(&op.issuer, buffer)?;
                self.i64_serializer.serialize(&op.max_supply, buffer)?;
                self.u64_serializer.serialize(&op.precision, buffer)?;
                self.i64_serializer.serialize(&op.initial_supply, buffer)?;
                self.i64_serializer.serialize(&op.initial_collateral, buffer)?;
            }
            OperationType::IssueAsset(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::IssueAsset), buffer)?;
                self.u32_serializer.serialize(&op.asset_id, buffer)?;
                self.i64_serializer.serialize(&op.amount, buffer)?;
                self.u32_serializer.serialize(&u32::from(op.source), buffer)?;
            }
            OperationType::AssetUpdateProperties(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::AssetUpdateProperties), buffer)?;
                self.u32_serializer.serialize(&op.asset_id, buffer)?;
                self.opt_u32_serializer
                    .serialize(&op.issuer_account_id, buffer)?;
                self.opt_string_serializer.serialize(&op.name, buffer)?;
                self.opt_string_serializer
                    .serialize(&op.description, buffer)?;
                self.opt_json_serializer.serialize(&op.public_data, buffer)?;
                self.opt_u64_serializer.serialize(&op.precision, buffer)?;
                self.opt_i64_serializer.serialize(&op.max_supply, buffer)?;
                self.opt_i64_serializer
                    .serialize(&op.withdrawal_fee, buffer)?;
                self.opt_u16_serializer
                    .serialize(&op.market_fee_rate, buffer)?;
            }
            OperationType::AssetUpdatePermissions(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::AssetUpdatePermissions), buffer)?;
                self.u32_serializer.serialize(&op.asset_id, buffer)?;
                self.opt_multisig_serializer
                    .serialize(&op.authority, buffer)?;
                self.opt_flags_serializer
                    .serialize(&op.authority_flag_permissions, buffer)?;
                self.opt_flags_serializer
                    .serialize(&op.active_flags, buffer)?;
            }
            OperationType::AssetUpdateWhitelist(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::AssetUpdateWhitelist), buffer)?;
                self.u32_serializer.serialize(&op.asset_id, buffer)?;
                self.u32_serializer.serialize(&u32::from(op.action), buffer)?;
                self.address_serializer.serialize(&op.address, buffer)?;
            }
            OperationType::Bid(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::Bid), buffer)?;
                self.serialize_order(op, buffer)?;
            }
            OperationType::Ask(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::Ask), buffer)?;
                self.serialize_order(op, buffer)?;
            }
            OperationType::Short(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::Short), buffer)?;
                self.i64_serializer.serialize(&op.amount, buffer)?;
                self.index_serializer.serialize(&op.index, buffer)?;
                self.opt_price_serializer
                    .serialize(&op.short_price_limit, buffer)?;
            }
            OperationType::Cover(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::Cover), buffer)?;
                self.i64_serializer.serialize(&op.amount, buffer)?;
                self.index_serializer.serialize(&op.index, buffer)?;
                self.opt_price_serializer
                    .serialize(&op.new_cover_price, buffer)?;
            }
            OperationType::AddCollateral(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::AddCollateral), buffer)?;
                self.serialize_order(op, buffer)?;
            }
            OperationType::RemoveCollateral(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::RemoveCollateral), buffer)?;
                self.serialize_order(op, buffer)?;
            }
            OperationType::BuyChips(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::BuyChips), buffer)?;
                self.address_serializer.serialize(&op.owner, buffer)?;
                self.asset_serializer.serialize(&op.amount, buffer)?;
            }
            OperationType::SellChips(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::SellChips), buffer)?;
                self.address_serializer.serialize(&op.owner, buffer)?;
                self.asset_serializer.serialize(&op.amount, buffer)?;
            }
            OperationType::Withdraw(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::Withdraw), buffer)?;
                self.address_serializer.serialize(&op.balance_id, buffer)?;
                self.i64_serializer.serialize(&op.amount, buffer)?;
            }
            OperationType::Deposit(op) => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::Deposit), buffer)?;
                self.condition_serializer.serialize(&op.condition, buffer)?;
                self.i64_serializer.serialize(&op.amount, buffer)?;
                self.u32_serializer.serialize(&op.asset_id, buffer)?;
            }
            OperationType::Custom { type_id, payload } => {
                self.u32_serializer
                    .serialize(&u32::from(OperationTypeId::Custom), buffer)?;
                self.u32_serializer.serialize(type_id, buffer)?;
                self.vec_u8_serializer.serialize(payload, buffer)?;
            }
        }
        Ok(())
    }
}

/// Deserializer for `OperationType`
pub struct OperationTypeDeserializer {
    u32_deserializer: U32VarIntDeserializer,
    precision_deserializer: U64VarIntDeserializer,
    i64_deserializer: I64VarIntDeserializer,
    symbol_deserializer: StringDeserializer,
    data_deserializer: StringDeserializer,
    json_deserializer: JsonValueDeserializer,
    payload_deserializer: VecU8Deserializer,
    address_deserializer: AddressDeserializer,
    asset_deserializer: AssetAmountDeserializer,
    issuer_deserializer: AssetIssuerDeserializer,
    index_deserializer: MarketIndexKeyDeserializer,
    condition_deserializer: WithdrawConditionDeserializer,
    opt_u16_deserializer: OptionDeserializer<u16, U16VarIntDeserializer>,
    opt_u32_deserializer: OptionDeserializer<u32, U32VarIntDeserializer>,
    opt_u64_deserializer: OptionDeserializer<u64, U64VarIntDeserializer>,
    opt_i64_deserializer: OptionDeserializer<i64, I64VarIntDeserializer>,
    opt_string_deserializer: OptionDeserializer<String, StringDeserializer>,
    opt_json_deserializer: OptionDeserializer<serde_json::Value, JsonValueDeserializer>,
    opt_price_deserializer: OptionDeserializer<Price, PriceDeserializer>,
    opt_multisig_deserializer: OptionDeserializer<MultisigCondition, MultisigConditionDeserializer>,
    opt_flags_deserializer: OptionDeserializer<AssetFlags, AssetFlagsDeserializer>,
}

impl OperationTypeDeserializer {
    /// Creates a new `OperationTypeDeserializer`
    pub fn new() -> Self {
        Self {
            u32_deserializer: U32VarIntDeserializer::new(Included(0), Included(u32::MAX)),
            precision_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
            i64_deserializer: I64VarIntDeserializer::new(Included(i64::MIN), Included(i64::MAX)),
            symbol_deserializer: StringDeserializer::new(MAX_SYMBOL_SIZE as u64),
            data_deserializer: StringDeserializer::new(MAX_NAME_DATA_SIZE),
            json_deserializer: JsonValueDeserializer::new(),
            payload_deserializer: VecU8Deserializer::new(
                Included(0),
                Included(MAX_CUSTOM_PAYLOAD_SIZE),
            ),
            address_deserializer: AddressDeserializer::new(),
            asset_deserializer: AssetAmountDeserializer::new(),
            issuer_deserializer: AssetIssuerDeserializer::new(),
            index_deserializer: MarketIndexKeyDeserializer::new(),
            condition_deserializer: WithdrawConditionDeserializer::new(),
            opt_u16_deserializer: OptionDeserializer::new(U16VarIntDeserializer::new(
                Included(0),
                Included(u16::MAX),
            )),
            opt_u32_deserializer: OptionDeserializer::new(U32VarIntDeserializer::new(
                Included(0),
                Included(u32::MAX),
            )),
            opt_u64_deserializer: OptionDeserializer::new(U64VarIntDeserializer::new(
                Included(0),
                Included(u64::MAX),
            )),
            opt_i64_deserializer: OptionDeserializer::new(I64VarIntDeserializer::new(
                Included(i64::MIN),
                Included(i64::MAX),
            )),
            opt_string_deserializer: OptionDeserializer::new(StringDeserializer::new(
                MAX_NAME_DATA_SIZE,
            )),
            opt_json_deserializer: OptionDeserializer::new(JsonValueDeserializer::new()),
            opt_price_deserializer: OptionDeserializer::new(PriceDeserializer::new()),
            opt_multisig_deserializer: OptionDeserializer::new(
                MultisigConditionDeserializer::new(),
            ),
            opt_flags_deserializer: OptionDeserializer::new(AssetFlagsDeserializer::new()),
        }
    }

    fn deserialize_order<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], OrderOperation, E> {
        tuple((
            context("Failed amount deserialization", |input| {
                self.i64_deserializer.deserialize(input)
            }),
            context("Failed index deserialization", |input| {
                self.index_deserializer.deserialize(input)
            }),
        ))
        .map(|(amount, index)| OrderOperation { amount, index })
        .parse(buffer)
    }

    fn deserialize_chips<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], ChipsOperation, E> {
        tuple((
            context("Failed owner deserialization", |input| {
                self.address_deserializer.deserialize(input)
            }),
            context("Failed amount deserialization", |input| {
                self.asset_deserializer.deserialize(input)
            }),
        ))
        .map(|(owner, amount)| ChipsOperation { owner, amount })
        .parse(buffer)
    }
}

impl Default for OperationTypeDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<OperationType> for OperationTypeDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], OperationType, E> {
        context("Failed OperationType deserialization", |buffer| {
            let (input, id) = self.u32_deserializer.deserialize(buffer)?;
            let id = OperationTypeId::try_from(id).map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(
                    buffer,
                    nom::error::ErrorKind::Eof,
                ))
            })?;
            match id {
                OperationTypeId::CreateAsset => context(
                    "Failed CreateAsset deserialization",
                    tuple((
                        context("Failed symbol deserialization", |input| {
                            self.symbol_deserializer.deserialize(input)
                        }),
                        context("Failed name deserialization", |input| {
                            self.data_deserializer.deserialize(input)
                        }),
                        context("Failed description deserialization", |input| {
                            self.data_deserializer.deserialize(input)
                        }),
                        context("Failed public_data deserialization", |input| {
                            self.json_deserializer.deserialize(input)
                        }),
                        context("Failed issuer deserialization", |input| {
                            self.issuer_deserializer.deserialize(input)
                        }),
                        context("Failed max_supply deserialization", |input| {
                            self.i64_deserializer.deserialize(input)
                        }),
                        context("Failed precision deserialization", |input| {
                            self.precision_deserializer.deserialize(input)
                        }),
                        context("Failed initial_supply deserialization", |input| {
                            self.i64_deserializer.deserialize(input)
                        }),
                        context("Failed initial_collateral deserialization", |input| {
                            self.i64_deserializer.deserialize(input)
                        }),
                    )),
                )
                .map(
                    |(
                        symbol,
                        name,
                        description,
                        public_data,
                        issuer,
                        max_supply,
                        precision,
                        initial_supply,
                        initial_collateral,
                    )| {
                        OperationType::CreateAsset(CreateAssetOperation {
                            symbol,
                            name,
                            description,
                            public_data,
                            issuer,
                            max_supply,
                            precision,
                            initial_supply,
                            initial_collateral,
                        })
                    },
                )
                .parse(input),
                OperationTypeId::IssueAsset => {
                    let (rest, (asset_id, amount, source)) = context(
                        "Failed IssueAsset deserialization",
                        tuple((
                            context("Failed asset_id deserialization", |input| {
                                self.u32_deserializer.deserialize(input)
                            }),
                            context("Failed amount deserialization", |input| {
                                self.i64_deserializer.deserialize(input)
                            }),
                            context("Failed source deserialization", |input| {
                                self.u32_deserializer.deserialize(input)
                            }),
                        )),
                    )
                    .parse(input)?;
                    let source = IssueSource::try_from(source).map_err(|_| {
                        nom::Err::Error(ParseError::from_error_kind(
                            input,
                            nom::error::ErrorKind::Verify,
                        ))
                    })?;
                    Ok((
                        rest,
                        OperationType::IssueAsset(IssueAssetOperation {
                            asset_id,
                            amount,
                            source,
                        }),
                    ))
                }
                OperationTypeId::AssetUpdateProperties => context(
                    "Failed AssetUpdateProperties deserialization",
                    tuple((
                        context("Failed asset_id deserialization", |input| {
                            self.u32_deserializer.deserialize(input)
                        }),
                        context("Failed issuer_account_id deserialization", |input| {
                            self.opt_u32_deserializer.deserialize(input)
                        }),
                        context("Failed name deserialization", |input| {
                            self.opt_string_deserializer.deserialize(input)
                        }),
                        context("Failed description deserialization", |input| {
                            self.opt_string_deserializer.deserialize(input)
                        }),
                        context("Failed public_data deserialization", |input| {
                            self.opt_json_deserializer.deserialize(input)
                        }),
                        context("Failed precision deserialization", |input| {
                            self.opt_u64_deserializer.deserialize(input)
                        }),
                        context("Failed max_supply deserialization", |input| {
                            self.opt_i64_deserializer.deserialize(input)
                        }),
                        context("Failed withdrawal_fee deserialization", |input| {
                            self.opt_i64_deserializer.deserialize(input)
                        }),
                        context("Failed market_fee_rate deserialization", |input| {
                            self.opt_u16_deserializer.deserialize(input)
                        }),
                    )),
                )
                .map(
                    |(
                        asset_id,
                        issuer_account_id,
                        name,
                        description,
                        public_data,
                        precision,
                        max_supply,
                        withdrawal_fee,
                        market_fee_rate,
                    )| {
                        OperationType::AssetUpdateProperties(AssetUpdatePropertiesOperation {
                            asset_id,
                            issuer_account_id,
                            name,
                            description,
                            public_data,
                            precision,
                            max_supply,
                            withdrawal_fee,
                            market_fee_rate,
                        })
                    },
                )
                .parse(input),
                OperationTypeId::AssetUpdatePermissions => context(
                    "Failed AssetUpdatePermissions deserialization",
                    tuple((
                        context("Failed asset_id deserialization", |input| {
                            self.u32_deserializer.deserialize(input)
                        }),
                        context("Failed authority deserialization", |input| {
                            self.opt_multisig_deserializer.deserialize(input)
                        }),
                        context("Failed authority_flag_permissions deserialization", |input| {
                            self.opt_flags_deserializer.deserialize(input)
                        }),
                        context("Failed active_flags deserialization", |input| {
                            self.opt_flags_deserializer.deserialize(input)
                        }),
                    )),
                )
                .map(
                    |(asset_id, authority, authority_flag_permissions, active_flags)| {
                        OperationType::AssetUpdatePermissions(AssetUpdatePermissionsOperation {
                            asset_id,
                            authority,
                            authority_flag_permissions,
                            active_flags,
                        })
                    },
                )
                .parse(input),
                OperationTypeId::AssetUpdateWhitelist => {
                    let (rest, (asset_id, action, address)) = context(
                        "Failed AssetUpdateWhitelist deserialization",
                        tuple((
                            context("Failed asset_id deserialization", |input| {
                                self.u32_deserializer.deserialize(input)
                            }),
                            context("Failed action deserialization", |input| {
                                self.u32_deserializer.deserialize(input)
                            }),
                            context("Failed address deserialization", |input| {
                                self.address_deserializer.deserialize(input)
                            }),
                        )),
                    )
                    .parse(input)?;
                    let action = WhitelistAction::try_from(action).map_err(|_| {
                        nom::Err::Error(ParseError::from_error_kind(
                            input,
                            nom::error::ErrorKind::Verify,
                        ))
                    })?;
                    Ok((
                        rest,
                        OperationType::AssetUpdateWhitelist(AssetUpdateWhitelistOperation {
                            asset_id,
                            action,
                            address,
                        }),
                    ))
                }
                OperationTypeId::Bid => context("Failed Bid deserialization", |input| {
                    self.deserialize_order(input)
                })
                .map(OperationType::Bid)
                .parse(input),
                OperationTypeId::Ask => context("Failed Ask deserialization", |input| {
                    self.deserialize_order(input)
                })
                .map(OperationType::Ask)
                .parse(input),
                OperationTypeId::Short => context(
                    "Failed Short deserialization",
                    tuple((
                        context("Failed amount deserialization", |input| {
                            self.i64_deserializer.deserialize(input)
                        }),
                        context("Failed index deserialization", |input| {
                            self.index_deserializer.deserialize(input)
                        }),
                        context("Failed short_price_limit deserialization", |input| {
                            self.opt_price_deserializer.deserialize(input)
                        }),
                    )),
                )
                .map(|(amount, index, short_price_limit)| {
                    OperationType::Short(ShortOperation {
                        amount,
                        index,
                        short_price_limit,
                    })
                })
                .parse(input),
                OperationTypeId::Cover => context(
                    "Failed Cover deserialization",
                    tuple((
                        context("Failed amount deserialization", |input| {
                            self.i64_deserializer.deserialize(input)
                        }),
                        context("Failed index deserialization", |input| {
                            self.index_deserializer.deserialize(input)
                        }),
                        context("Failed new_cover_price deserialization", |input| {
                            self.opt_price_deserializer.deserialize(input)
                        }),
                    )),
                )
                .map(|(amount, index, new_cover_price)| {
                    OperationType::Cover(CoverOperation {
                        amount,
                        index,
                        new_cover_price,
                    })
                })
                .parse(input),
                OperationTypeId::AddCollateral => {
                    context("Failed AddCollateral deserialization", |input| {
                        self.deserialize_order(input)
                    })
                    .map(OperationType::AddCollateral)
                    .parse(input)
                }
                OperationTypeId::RemoveCollateral => {
                    context("Failed RemoveCollateral deserialization", |input| {
                        self.deserialize_order(input)
                    })
                    .map(OperationType::RemoveCollateral)
                    .parse(input)
                }
                OperationTypeId::BuyChips => context("Failed BuyChips deserialization", |input| {
                    self.deserialize_chips(input)
                })
                .map(OperationType::BuyChips)
                .parse(input),
                OperationTypeId::SellChips => {
                    context("Failed SellChips deserialization", |input| {
                        self.deserialize_chips(input)
                    })
                    .map(OperationType::SellChips)
                    .parse(input)
                }
                OperationTypeId::Withdraw => context(
                    "Failed Withdraw deserialization",
                    tuple((
                        context("Failed balance_id deserialization", |input| {
                            self.address_deserializer.deserialize(input)
                        }),
                        context("Failed amount deserialization", |input| {
                            self.i64_deserializer.deserialize(input)
                        }),
                    )),
                )
                .map(|(balance_id, amount)| {
                    OperationType::Withdraw(WithdrawOperation { balance_id, amount })
                })
                .parse(input),
                OperationTypeId::Deposit => context(
                    "Failed Deposit deserialization",
                    tuple((
                        context("Failed condition deserialization", |input| {
                            self.condition_deserializer.deserialize(input)
                        }),
                        context("Failed amount deserialization", |input| {
                            self.i64_deserializer.deserialize(input)
                        }),
                        context("Failed asset_id deserialization", |input| {
                            self.u32_deserializer.deserialize(input)
                        }),
                    )),
                )
                .map(|(condition, amount, asset_id)| {
                    OperationType::Deposit(DepositOperation {
                        condition,
                        amount,
                        asset_id,
                    })
                })
                .parse(input),
                OperationTypeId::Custom => context(
                    "Failed Custom deserialization",
                    tuple((
                        context("Failed type_id deserialization", |input| {
                            self.u32_deserializer.deserialize(input)
                        }),
                        context("Failed payload deserialization", |input| {
                            self.payload_deserializer.deserialize(input)
                        }),
                    )),
                )
                .map(|(type_id, payload)| OperationType::Custom { type_id, payload })
                .parse(input),
            }
        })
        .parse(buffer)
    }
}
