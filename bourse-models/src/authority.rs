// Copyright (c) 2024 BOURSE LABS

use crate::address::{Address, AddressDeserializer, AddressSerializer};
use crate::config::constants::MAX_MULTISIG_OWNERS;
use bourse_serialization::{
    Deserializer, SerializeError, Serializer, U32VarIntDeserializer, U32VarIntSerializer,
};
use nom::error::{context, ContextError, ParseError};
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Bound::Included;

/// `required` signatures out of the `owners` set
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MultisigCondition {
    /// signature threshold
    pub required: u32,
    /// keys allowed to sign
    pub owners: BTreeSet<Address>,
}

impl MultisigCondition {
    /// Condition satisfied by a signature of `owner`
    pub fn single(owner: Address) -> Self {
        MultisigCondition {
            required: 1,
            owners: BTreeSet::from([owner]),
        }
    }

    /// A usable condition needs at least one owner and a threshold of at least one
    pub fn is_valid(&self) -> bool {
        self.required >= 1 && !self.owners.is_empty()
    }

    /// Whether `signers` contains at least `required` owners
    pub fn is_satisfied_by(&self, signers: &BTreeSet<Address>) -> bool {
        if self.required == 0 {
            return false;
        }
        let signed = self.owners.intersection(signers).count();
        u32::try_from(signed).map_or(true, |signed| signed >= self.required)
    }
}

/// Serializer for `MultisigCondition`
#[derive(Default, Clone)]
pub struct MultisigConditionSerializer {
    u32_serializer: U32VarIntSerializer,
    address_serializer: AddressSerializer,
}

impl MultisigConditionSerializer {
    /// Creates a new `MultisigConditionSerializer`
    pub const fn new() -> Self {
        Self {
            u32_serializer: U32VarIntSerializer::new(),
            address_serializer: AddressSerializer::new(),
        }
    }
}

impl Serializer<MultisigCondition> for MultisigConditionSerializer {
    fn serialize(
        &self,
        value: &MultisigCondition,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.u32_serializer.serialize(&value.required, buffer)?;
        let count: u32 = value.owners.len().try_into().map_err(|_| {
            SerializeError::NumberTooBig("too many owners in multisig condition".to_string())
        })?;
        self.u32_serializer.serialize(&count, buffer)?;
        for owner in &value.owners {
            self.address_serializer.serialize(owner, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `MultisigCondition`
#[derive(Clone)]
pub struct MultisigConditionDeserializer {
    required_deserializer: U32VarIntDeserializer,
    count_deserializer: U32VarIntDeserializer,
    address_deserializer: AddressDeserializer,
}

impl MultisigConditionDeserializer {
    /// Creates a new `MultisigConditionDeserializer`
    pub const fn new() -> Self {
        Self {
            required_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(MAX_MULTISIG_OWNERS),
            ),
            count_deserializer: U32VarIntDeserializer::new(
                Included(0),
                Included(MAX_MULTISIG_OWNERS),
            ),
            address_deserializer: AddressDeserializer::new(),
        }
    }
}

impl Default for MultisigConditionDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<MultisigCondition> for MultisigConditionDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], MultisigCondition, E> {
        context(
            "Failed MultisigCondition deserialization",
            tuple((
                context("Failed required deserialization", |input| {
                    self.required_deserializer.deserialize(input)
                }),
                length_count(
                    context("Failed owner count deserialization", |input| {
                        self.count_deserializer.deserialize(input)
                    }),
                    context("Failed owner deserialization", |input| {
                        self.address_deserializer.deserialize(input)
                    }),
                ),
            )),
        )
        .map(|(required, owners)| MultisigCondition {
            required,
            owners: owners.into_iter().collect(),
        })
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(seed: &str) -> Address {
        Address::from_public_key_bytes(seed.as_bytes())
    }

    #[test]
    fn test_threshold() {
        let condition = MultisigCondition {
            required: 2,
            owners: BTreeSet::from([addr("a"), addr("b"), addr("c")]),
        };
        assert!(!condition.is_satisfied_by(&BTreeSet::from([addr("a"), addr("z")])));
        assert!(condition.is_satisfied_by(&BTreeSet::from([addr("a"), addr("c")])));
    }

    #[test]
    fn test_invalid_definitions() {
        assert!(!MultisigCondition::default().is_valid());
        let zero_required = MultisigCondition {
            required: 0,
            owners: BTreeSet::from([addr("a")]),
        };
        assert!(!zero_required.is_valid());
        assert!(!zero_required.is_satisfied_by(&BTreeSet::from([addr("a")])));
        assert!(MultisigCondition::single(addr("a")).is_valid());
    }
}
