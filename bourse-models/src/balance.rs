// Copyright (c) 2024 BOURSE LABS

//! Balance records: funds held outside of any market order, owned by a withdraw condition

use crate::address::{Address, AddressDeserializer, AddressSerializer};
use crate::amount::{Asset, ShareAmount};
use crate::asset::AssetId;
use crate::authority::{
    MultisigCondition, MultisigConditionDeserializer, MultisigConditionSerializer,
};
use bourse_hash::Hash;
use bourse_serialization::{
    Deserializer, SerializeError, Serializer, U32VarIntDeserializer, U32VarIntSerializer,
};
use bourse_time::BourseTime;
use nom::error::{context, ContextError, ParseError};
use nom::{IResult, Parser};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// Balance records are addressed by the hash of their condition and asset
pub type BalanceId = Address;

/// Signatures required to spend a balance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WithdrawCondition {
    /// a single key
    Signature {
        /// key that must sign
        owner: Address,
    },
    /// a threshold of keys
    Multisig(MultisigCondition),
}

#[derive(IntoPrimitive, Debug, Eq, PartialEq, TryFromPrimitive)]
#[repr(u32)]
enum WithdrawConditionId {
    Signature = 0,
    Multisig = 1,
}

impl WithdrawCondition {
    /// The condition as a multisig, a single signature being a 1-of-1
    pub fn as_multisig(&self) -> MultisigCondition {
        match self {
            WithdrawCondition::Signature { owner } => MultisigCondition::single(*owner),
            WithdrawCondition::Multisig(condition) => condition.clone(),
        }
    }

    /// Identifier of the balance holding `asset_id` under this condition
    pub fn balance_id(&self, asset_id: AssetId) -> Result<BalanceId, SerializeError> {
        let mut buffer = Vec::new();
        U32VarIntSerializer::new().serialize(&asset_id, &mut buffer)?;
        WithdrawConditionSerializer::new().serialize(self, &mut buffer)?;
        Ok(Address(Hash::compute_from(&buffer)))
    }
}

/// Funds of one asset locked under one withdraw condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    /// who can spend
    pub condition: WithdrawCondition,
    /// denomination
    pub asset_id: AssetId,
    /// amount held
    pub balance: ShareAmount,
    /// time of the last mutation
    pub last_update: BourseTime,
}

impl BalanceRecord {
    /// Empty balance for `condition`
    pub fn new(condition: WithdrawCondition, asset_id: AssetId) -> Self {
        BalanceRecord {
            condition,
            asset_id,
            balance: 0,
            last_update: BourseTime::default(),
        }
    }

    /// Identifier of the record
    pub fn id(&self) -> Result<BalanceId, SerializeError> {
        self.condition.balance_id(self.asset_id)
    }

    /// Held funds as an asset amount
    pub fn get_balance(&self) -> Asset {
        Asset::new(self.balance, self.asset_id)
    }
}

/// Serializer for `WithdrawCondition`
#[derive(Default, Clone)]
pub struct WithdrawConditionSerializer {
    u32_serializer: U32VarIntSerializer,
    address_serializer: AddressSerializer,
    multisig_serializer: MultisigConditionSerializer,
}

impl WithdrawConditionSerializer {
    /// Creates a new `WithdrawConditionSerializer`
    pub const fn new() -> Self {
        Self {
            u32_serializer: U32VarIntSerializer::new(),
            address_serializer: AddressSerializer::new(),
            multisig_serializer: MultisigConditionSerializer::new(),
        }
    }
}

impl Serializer<WithdrawCondition> for WithdrawConditionSerializer {
    fn serialize(
        &self,
        value: &WithdrawCondition,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        match value {
            WithdrawCondition::Signature { owner } => {
                self.u32_serializer
                    .serialize(&u32::from(WithdrawConditionId::Signature), buffer)?;
                self.address_serializer.serialize(owner, buffer)
            }
            WithdrawCondition::Multisig(condition) => {
                self.u32_serializer
                    .serialize(&u32::from(WithdrawConditionId::Multisig), buffer)?;
                self.multisig_serializer.serialize(condition, buffer)
            }
        }
    }
}

/// Deserializer for `WithdrawCondition`
#[derive(Clone)]
pub struct WithdrawConditionDeserializer {
    u32_deserializer: U32VarIntDeserializer,
    address_deserializer: AddressDeserializer,
    multisig_deserializer: MultisigConditionDeserializer,
}

impl WithdrawConditionDeserializer {
    /// Creates a new `WithdrawConditionDeserializer`
    pub const fn new() -> Self {
        Self {
            u32_deserializer: U32VarIntDeserializer::new(Included(0), Included(u32::MAX)),
            address_deserializer: AddressDeserializer::new(),
            multisig_deserializer: MultisigConditionDeserializer::new(),
        }
    }
}

impl Default for WithdrawConditionDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<WithdrawCondition> for WithdrawConditionDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], WithdrawCondition, E> {
        context("Failed WithdrawCondition deserialization", |buffer| {
            let (input, id) = self.u32_deserializer.deserialize(buffer)?;
            let id = WithdrawConditionId::try_from(id).map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(
                    buffer,
                    nom::error::ErrorKind::Eof,
                ))
            })?;
            match id {
                WithdrawConditionId::Signature => context("Failed owner deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                })
                .map(|owner| WithdrawCondition::Signature { owner })
                .parse(input),
                WithdrawConditionId::Multisig => {
                    context("Failed multisig deserialization", |input| {
                        self.multisig_deserializer.deserialize(input)
                    })
                    .map(WithdrawCondition::Multisig)
                    .parse(input)
                }
            }
        })
        .parse(buffer)
    }
}
