// Copyright (c) 2024 BOURSE LABS

//! Asset records, issuer tags and permission flags

use crate::account::AccountId;
use crate::address::Address;
use crate::amount::ShareAmount;
use crate::authority::MultisigCondition;
use crate::config::constants::{
    MAX_PRECISION, MAX_SUB_SYMBOL_SIZE, MAX_SYMBOL_SIZE, MIN_SYMBOL_SIZE, RESERVED_SYMBOL_PREFIX,
};
use crate::game::GameId;
use bourse_serialization::{
    Deserializer, SerializeError, Serializer, U32VarIntDeserializer, U32VarIntSerializer,
};
use bourse_time::BourseTime;
use nom::error::{context, ContextError, ParseError};
use nom::{IResult, Parser};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Bound::Included;

/// Asset identifier, the core asset is 0
pub type AssetId = u32;

/// Who controls the supply of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetIssuer {
    /// issued by an account through its authority
    User(AccountId),
    /// chips of a game, backed by the core asset
    Game(GameId),
    /// created and destroyed by short and cover trading only
    Market,
    /// core asset, its supply is fixed at genesis
    Genesis,
}

#[derive(IntoPrimitive, Debug, Eq, PartialEq, TryFromPrimitive)]
#[repr(u32)]
enum AssetIssuerId {
    User = 0,
    Game = 1,
    Market = 2,
    Genesis = 3,
}

/// Per-asset capability bit
#[derive(
    IntoPrimitive, TryFromPrimitive, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[repr(u32)]
pub enum AssetFlag {
    /// `max_supply` can change while shares are outstanding
    DynamicMaxSupply = 1 << 0,
    /// withdrawal and market fees can change while shares are outstanding
    DynamicFees = 1 << 1,
    /// markets of the asset are halted
    HaltedMarkets = 1 << 2,
    /// balances of the asset can not be withdrawn
    HaltedWithdrawals = 1 << 3,
    /// the authority can retract balances
    RetractableBalances = 1 << 4,
    /// only whitelisted addresses can receive the asset
    RestrictedDeposits = 1 << 5,
}

impl AssetFlag {
    /// Every defined flag, in bit order
    pub const ALL: [AssetFlag; 6] = [
        AssetFlag::DynamicMaxSupply,
        AssetFlag::DynamicFees,
        AssetFlag::HaltedMarkets,
        AssetFlag::HaltedWithdrawals,
        AssetFlag::RetractableBalances,
        AssetFlag::RestrictedDeposits,
    ];
}

/// Set of `AssetFlag`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetFlags(u32);

impl AssetFlags {
    /// No flag set
    pub const fn empty() -> Self {
        AssetFlags(0)
    }

    /// Every defined flag set
    pub fn all() -> Self {
        AssetFlag::ALL.into_iter().collect()
    }

    /// Builds a set from raw bits, `None` if an undefined bit is set
    pub fn from_bits(bits: u32) -> Option<Self> {
        let known = AssetFlags::all().0;
        (bits & !known == 0).then_some(AssetFlags(bits))
    }

    /// Raw bits
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Whether `flag` is in the set
    pub fn contains(&self, flag: AssetFlag) -> bool {
        self.0 & u32::from(flag) != 0
    }

    /// Adds `flag` to the set
    pub fn insert(&mut self, flag: AssetFlag) {
        self.0 |= u32::from(flag);
    }

    /// Removes `flag` from the set
    pub fn remove(&mut self, flag: AssetFlag) {
        self.0 &= !u32::from(flag);
    }

    /// Flags of the set, in bit order
    pub fn iter(&self) -> impl Iterator<Item = AssetFlag> + '_ {
        AssetFlag::ALL.into_iter().filter(|flag| self.contains(*flag))
    }
}

impl FromIterator<AssetFlag> for AssetFlags {
    fn from_iter<I: IntoIterator<Item = AssetFlag>>(iter: I) -> Self {
        let mut flags = AssetFlags::empty();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

/// Registered asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// identifier
    pub id: AssetId,
    /// unique, possibly hierarchical, ticker
    pub symbol: String,
    /// display name
    pub name: String,
    /// free text
    pub description: String,
    /// opaque data attached by the issuer
    pub public_data: serde_json::Value,
    /// supply controller
    pub issuer: AssetIssuer,
    /// signatures needed to issue or update the asset
    pub authority: MultisigCondition,
    /// shares per displayed unit, a power of ten
    pub precision: u64,
    /// supply cap
    pub max_supply: ShareAmount,
    /// shares in circulation
    pub current_supply: ShareAmount,
    /// core asset shares backing the supply (chip assets)
    pub current_collateral: ShareAmount,
    /// fees collected by the asset, withdrawable by its authority
    pub collected_fees: ShareAmount,
    /// fee charged on every withdrawal
    pub withdrawal_fee: ShareAmount,
    /// fee charged on market fills, in basis points
    pub market_fee_rate: u16,
    /// flags currently in effect
    pub active_flags: AssetFlags,
    /// flags the authority is allowed to activate
    pub authority_flag_permissions: AssetFlags,
    /// addresses allowed to hold the asset when deposits are restricted
    pub whitelist: BTreeSet<Address>,
    /// creation time
    pub registration_date: BourseTime,
    /// time of the last mutation
    pub last_update: BourseTime,
}

impl AssetRecord {
    /// Supply controlled by an account authority
    pub fn is_user_issued(&self) -> bool {
        matches!(self.issuer, AssetIssuer::User(_))
    }

    /// Supply controlled by short and cover trading
    pub fn is_market_issued(&self) -> bool {
        matches!(self.issuer, AssetIssuer::Market)
    }

    /// Game chips, exchangeable against the core asset at the collateral ratio
    pub fn is_chip_asset(&self) -> bool {
        matches!(self.issuer, AssetIssuer::Game(_))
    }

    #[allow(missing_docs)]
    pub fn flag_is_active(&self, flag: AssetFlag) -> bool {
        self.active_flags.contains(flag)
    }

    #[allow(missing_docs)]
    pub fn authority_has_flag_permission(&self, flag: AssetFlag) -> bool {
        self.authority_flag_permissions.contains(flag)
    }

    /// Shares that can still be issued
    pub fn available_shares(&self) -> ShareAmount {
        self.max_supply.saturating_sub(self.current_supply)
    }
}

/// Primary symbol of a hierarchical symbol (`CRY` for `CRY.ABC`)
pub fn parent_symbol(symbol: &str) -> Option<&str> {
    symbol.split_once('.').map(|(parent, _)| parent)
}

/// Whether `n` is one of 10^0 ..= 10^15
pub fn is_power_of_ten(n: u64) -> bool {
    let mut power = 1u64;
    while power <= MAX_PRECISION {
        if power == n {
            return true;
        }
        power *= 10;
    }
    false
}

/// Symbol naming rules.
///
/// A primary symbol is 3 to 8 uppercase letters (no digits, to avoid 0/O and
/// 1/I spoofing). A hierarchical symbol is a primary symbol, a dot, and a
/// sub-symbol of at most 8 uppercase letters or digits, 12 characters in total.
///
/// ```
/// # use bourse_models::asset::is_valid_symbol;
/// assert!(is_valid_symbol("ABC"));
/// assert!(is_valid_symbol("CRY.ABCDEFGH"));
/// assert!(!is_valid_symbol("CRYPTO.ABCDEFGHX"));
/// ```
pub fn is_valid_symbol(symbol: &str) -> bool {
    if symbol.len() < MIN_SYMBOL_SIZE || !symbol.is_ascii() {
        return false;
    }
    if symbol.starts_with(RESERVED_SYMBOL_PREFIX) {
        return false;
    }
    match symbol.split_once('.') {
        None => {
            symbol.len() <= MAX_SUB_SYMBOL_SIZE && symbol.bytes().all(|c| c.is_ascii_uppercase())
        }
        Some((primary, sub)) => {
            (MIN_SYMBOL_SIZE..=MAX_SUB_SYMBOL_SIZE).contains(&primary.len())
                && !sub.is_empty()
                && symbol.len() <= MAX_SYMBOL_SIZE
                && sub.len() <= MAX_SUB_SYMBOL_SIZE
                && primary.bytes().all(|c| c.is_ascii_uppercase())
                && sub
                    .bytes()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        }
    }
}

/// Serializer for `AssetIssuer`
#[derive(Default, Clone)]
pub struct AssetIssuerSerializer {
    u32_serializer: U32VarIntSerializer,
}

impl AssetIssuerSerializer {
    /// Creates a new `AssetIssuerSerializer`
    pub const fn new() -> Self {
        Self {
            u32_serializer: U32VarIntSerializer::new(),
        }
    }
}

impl Serializer<AssetIssuer> for AssetIssuerSerializer {
    fn serialize(&self, value: &AssetIssuer, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        match value {
            AssetIssuer::User(account_id) => {
                self.u32_serializer
                    .serialize(&u32::from(AssetIssuerId::User), buffer)?;
                self.u32_serializer.serialize(account_id, buffer)
            }
            AssetIssuer::Game(game_id) => {
                self.u32_serializer
                    .serialize(&u32::from(AssetIssuerId::Game), buffer)?;
                self.u32_serializer.serialize(game_id, buffer)
            }
            AssetIssuer::Market => self
                .u32_serializer
                .serialize(&u32::from(AssetIssuerId::Market), buffer),
            AssetIssuer::Genesis => self
                .u32_serializer
                .serialize(&u32::from(AssetIssuerId::Genesis), buffer),
        }
    }
}

/// Deserializer for `AssetIssuer`
#[derive(Clone)]
pub struct AssetIssuerDeserializer {
    u32_deserializer: U32VarIntDeserializer,
}

impl AssetIssuerDeserializer {
    /// Creates a new `AssetIssuerDeserializer`
    pub const fn new() -> Self {
        Self {
            u32_deserializer: U32VarIntDeserializer::new(Included(0), Included(u32::MAX)),
        }
    }
}

impl Default for AssetIssuerDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<AssetIssuer> for AssetIssuerDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], AssetIssuer, E> {
        context("Failed AssetIssuer deserialization", |buffer| {
            let (input, id) = self.u32_deserializer.deserialize(buffer)?;
            let id = AssetIssuerId::try_from(id).map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(
                    buffer,
                    nom::error::ErrorKind::Eof,
                ))
            })?;
            match id {
                AssetIssuerId::User => context("Failed account_id deserialization", |input| {
                    self.u32_deserializer.deserialize(input)
                })
                .map(AssetIssuer::User)
                .parse(input),
                AssetIssuerId::Game => context("Failed game_id deserialization", |input| {
                    self.u32_deserializer.deserialize(input)
                })
                .map(AssetIssuer::Game)
                .parse(input),
                AssetIssuerId::Market => Ok((input, AssetIssuer::Market)),
                AssetIssuerId::Genesis => Ok((input, AssetIssuer::Genesis)),
            }
        })
        .parse(buffer)
    }
}

/// Serializer for `AssetFlags`
#[derive(Default, Clone)]
pub struct AssetFlagsSerializer {
    u32_serializer: U32VarIntSerializer,
}

impl AssetFlagsSerializer {
    /// Creates a new `AssetFlagsSerializer`
    pub const fn new() -> Self {
        Self {
            u32_serializer: U32VarIntSerializer::new(),
        }
    }
}

impl Serializer<AssetFlags> for AssetFlagsSerializer {
    fn serialize(&self, value: &AssetFlags, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u32_serializer.serialize(&value.bits(), buffer)
    }
}

/// Deserializer for `AssetFlags`, undefined bits are rejected
#[derive(Clone)]
pub struct AssetFlagsDeserializer {
    u32_deserializer: U32VarIntDeserializer,
}

impl AssetFlagsDeserializer {
    /// Creates a new `AssetFlagsDeserializer`
    pub const fn new() -> Self {
        Self {
            u32_deserializer: U32VarIntDeserializer::new(Included(0), Included(u32::MAX)),
        }
    }
}

impl Default for AssetFlagsDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<AssetFlags> for AssetFlagsDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], AssetFlags, E> {
        context("Failed AssetFlags deserialization", |input| {
            let (rest, bits) = self.u32_deserializer.deserialize(input)?;
            let flags = AssetFlags::from_bits(bits).ok_or_else(|| {
                nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::Verify,
                ))
            })?;
            Ok((rest, flags))
        })
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bourse_serialization::DeserializeError;

    #[test]
    fn test_symbol_rules() {
        assert!(is_valid_symbol("ABC"));
        assert!(is_valid_symbol("ABCDEFGH"));
        assert!(!is_valid_symbol("ABCDEFGHI"));
        assert!(!is_valid_symbol("ab"));
        assert!(!is_valid_symbol("abc"));
        assert!(!is_valid_symbol("AB1"));
        assert!(!is_valid_symbol("BIT123"));
        assert!(!is_valid_symbol("BITCOIN"));
        assert!(is_valid_symbol("CRY.ABCDEFGH"));
        assert!(is_valid_symbol("CRY.A1"));
        assert!(!is_valid_symbol("CRYPTO.ABCDEFGHX"));
        assert!(!is_valid_symbol("CRY.ABC.DEF"));
        assert!(!is_valid_symbol(".ABC"));
        assert!(!is_valid_symbol("ABC."));
        assert!(!is_valid_symbol("CR1.ABC"));
        assert!(!is_valid_symbol("AB.CD"));
        assert!(!is_valid_symbol("A.BCD"));
        assert!(!is_valid_symbol("ABCDEFGHI.A"));
        assert!(is_valid_symbol("ABCDEFGH.A"));
    }

    #[test]
    fn test_power_of_ten() {
        assert!(is_power_of_ten(1));
        assert!(is_power_of_ten(100_000));
        assert!(is_power_of_ten(1_000_000_000_000_000));
        assert!(!is_power_of_ten(10_000_000_000_000_000));
        assert!(!is_power_of_ten(0));
        assert!(!is_power_of_ten(20));
    }

    #[test]
    fn test_flag_set() {
        let mut flags: AssetFlags = [AssetFlag::DynamicFees, AssetFlag::RestrictedDeposits]
            .into_iter()
            .collect();
        assert!(flags.contains(AssetFlag::DynamicFees));
        assert!(!flags.contains(AssetFlag::HaltedMarkets));
        flags.remove(AssetFlag::DynamicFees);
        assert_eq!(flags.iter().collect::<Vec<_>>(), vec![AssetFlag::RestrictedDeposits]);
        assert!(AssetFlags::from_bits(1 << 20).is_none());
    }

    #[test]
    fn test_undefined_flag_bits_are_rejected() {
        let mut buffer = Vec::new();
        U32VarIntSerializer::new().serialize(&(1 << 9), &mut buffer).unwrap();
        assert!(AssetFlagsDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .is_err());
    }

    #[test]
    fn test_issuer_encoding() {
        let mut buffer = Vec::new();
        AssetIssuerSerializer::new()
            .serialize(&AssetIssuer::Game(9), &mut buffer)
            .unwrap();
        let (rest, issuer) = AssetIssuerDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(issuer, AssetIssuer::Game(9));
    }
}
