// Copyright (c) 2024 BOURSE LABS

use crate::config::constants::ADDRESS_PREFIX;
use crate::error::ModelsError;
use bourse_hash::{Hash, HashDeserializer, HashSerializer, HASH_SIZE_BYTES};
use bourse_serialization::{Deserializer, SerializeError, Serializer};
use nom::error::{context, ContextError, ParseError};
use nom::{IResult, Parser};
use std::str::FromStr;

/// Size of a serialized address, in bytes
pub const ADDRESS_SIZE_BYTES: usize = HASH_SIZE_BYTES;

/// Derived from a public key hash, or from the hash of a withdraw condition for balance ids.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Address(pub Hash);

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", ADDRESS_PREFIX, self.0.to_bs58_check())
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl ::serde::Serialize for Address {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self.to_string())
        } else {
            s.serialize_bytes(self.to_bytes())
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for Address {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        if d.is_human_readable() {
            struct AddressVisitor;

            impl<'de> ::serde::de::Visitor<'de> for AddressVisitor {
                type Value = Address;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("BRS + base58::encode(hash)")
                }

                fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    Address::from_str(v).map_err(E::custom)
                }
            }
            d.deserialize_str(AddressVisitor)
        } else {
            struct BytesVisitor;

            impl<'de> ::serde::de::Visitor<'de> for BytesVisitor {
                type Value = Address;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("a bytestring")
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    Ok(Address::from_bytes(v.try_into().map_err(E::custom)?))
                }
            }

            d.deserialize_bytes(BytesVisitor)
        }
    }
}

impl FromStr for Address {
    type Err = ModelsError;

    /// ## Example
    /// ```rust
    /// # use bourse_models::Address;
    /// # use std::str::FromStr;
    /// let address = Address::from_public_key_bytes(b"alice");
    /// assert_eq!(Address::from_str(&address.to_string()).unwrap(), address);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix(ADDRESS_PREFIX) {
            Some(data) => Ok(Address(Hash::from_bs58_check(data)?)),
            None => Err(ModelsError::WrongPrefix(
                ADDRESS_PREFIX.to_string(),
                s.chars().take(ADDRESS_PREFIX.len()).collect(),
            )),
        }
    }
}

impl Address {
    /// Address owned by the holder of the given public key
    pub fn from_public_key_bytes(public_key: &[u8]) -> Self {
        Address(Hash::compute_from(public_key))
    }

    /// Raw bytes of the address
    pub fn to_bytes(&self) -> &[u8; ADDRESS_SIZE_BYTES] {
        self.0.to_bytes()
    }

    /// Rebuilds an address from its raw bytes
    pub fn from_bytes(data: &[u8; ADDRESS_SIZE_BYTES]) -> Self {
        Address(Hash::from_bytes(data))
    }
}

/// Serializer for `Address`
#[derive(Default, Clone)]
pub struct AddressSerializer {
    hash_serializer: HashSerializer,
}

impl AddressSerializer {
    /// Serializes an `Address` into a `Vec<u8>`
    pub const fn new() -> Self {
        Self {
            hash_serializer: HashSerializer::new(),
        }
    }
}

impl Serializer<Address> for AddressSerializer {
    fn serialize(&self, value: &Address, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.hash_serializer.serialize(&value.0, buffer)
    }
}

/// Deserializer for `Address`
#[derive(Default, Clone)]
pub struct AddressDeserializer {
    hash_deserializer: HashDeserializer,
}

impl AddressDeserializer {
    /// Creates a new deserializer for `Address`
    pub const fn new() -> Self {
        Self {
            hash_deserializer: HashDeserializer::new(),
        }
    }
}

impl Deserializer<Address> for AddressDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Address, E> {
        context("Failed Address deserialization", |input| {
            self.hash_deserializer.deserialize(input)
        })
        .map(Address)
        .parse(buffer)
    }
}
