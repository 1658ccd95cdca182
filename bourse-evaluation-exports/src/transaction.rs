// Copyright (c) 2024 BOURSE LABS

use crate::error::EvaluationError;
use bourse_hash::Hash;
use bourse_models::config::constants::MAX_OPERATIONS_PER_TRANSACTION;
use bourse_models::operation::{OperationTypeDeserializer, OperationTypeSerializer};
use bourse_models::{Address, AssetId, OperationType, ShareAmount};
use bourse_serialization::{
    Deserializer, SerializeError, Serializer, U32VarIntDeserializer, U32VarIntSerializer,
};
use bourse_time::{BourseTime, BourseTimeDeserializer, BourseTimeSerializer};
use nom::error::{context, ContextError, ParseError};
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound::{Included, Unbounded};

/// Ordered operations evaluated atomically.
///
/// Signature verification happens before evaluation: `signers` holds the
/// addresses whose signatures over the transaction were checked. They are not
/// part of the signed content and are left out of the encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// the transaction is rejected once the chain time is past this point
    pub expiration: BourseTime,
    #[allow(missing_docs)]
    pub operations: Vec<OperationType>,
    /// addresses that signed the transaction
    #[serde(default)]
    pub signers: BTreeSet<Address>,
}

impl Transaction {
    /// Hash of the encoded transaction
    pub fn id(&self) -> Result<Hash, EvaluationError> {
        let mut buffer = Vec::new();
        TransactionSerializer::new().serialize(self, &mut buffer)?;
        Ok(Hash::compute_from(&buffer))
    }
}

/// Outcome of a successfully evaluated transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    /// leftover of every asset the transaction did not spend, collected as fees
    pub fees_paid: BTreeMap<AssetId, ShareAmount>,
    /// number of operations applied
    pub operation_count: usize,
}

/// Serializer for `Transaction`
pub struct TransactionSerializer {
    time_serializer: BourseTimeSerializer,
    u32_serializer: U32VarIntSerializer,
    operation_serializer: OperationTypeSerializer,
}

impl TransactionSerializer {
    /// Creates a new `TransactionSerializer`
    pub fn new() -> Self {
        Self {
            time_serializer: BourseTimeSerializer::new(),
            u32_serializer: U32VarIntSerializer::new(),
            operation_serializer: OperationTypeSerializer::new(),
        }
    }
}

impl Default for TransactionSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<Transaction> for TransactionSerializer {
    fn serialize(&self, value: &Transaction, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.time_serializer.serialize(&value.expiration, buffer)?;
        let count: u32 = value.operations.len().try_into().map_err(|_| {
            SerializeError::NumberTooBig("too many operations in transaction".to_string())
        })?;
        self.u32_serializer.serialize(&count, buffer)?;
        for operation in &value.operations {
            self.operation_serializer.serialize(operation, buffer)?;
        }
        Ok(())
    }
}

/// Deserializer for `Transaction`
pub struct TransactionDeserializer {
    time_deserializer: BourseTimeDeserializer,
    count_deserializer: U32VarIntDeserializer,
    operation_deserializer: OperationTypeDeserializer,
}

impl TransactionDeserializer {
    /// Creates a new `TransactionDeserializer` accepting at most `max_operations` operations
    pub fn new(max_operations: u32) -> Self {
        Self {
            time_deserializer: BourseTimeDeserializer::new((
                Included(BourseTime::from_millis(0)),
                Unbounded,
            )),
            count_deserializer: U32VarIntDeserializer::new(Included(0), Included(max_operations)),
            operation_deserializer: OperationTypeDeserializer::new(),
        }
    }
}

impl Default for TransactionDeserializer {
    fn default() -> Self {
        Self::new(MAX_OPERATIONS_PER_TRANSACTION)
    }
}

impl Deserializer<Transaction> for TransactionDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Transaction, E> {
        context(
            "Failed Transaction deserialization",
            tuple((
                context("Failed expiration deserialization", |input| {
                    self.time_deserializer.deserialize(input)
                }),
                length_count(
                    context("Failed operation count deserialization", |input| {
                        self.count_deserializer.deserialize(input)
                    }),
                    context("Failed operation deserialization", |input| {
                        self.operation_deserializer.deserialize(input)
                    }),
                ),
            )),
        )
        .map(|(expiration, operations)| Transaction {
            expiration,
            operations,
            signers: BTreeSet::new(),
        })
        .parse(buffer)
    }
}
