// Copyright (c) 2024 BOURSE LABS

use bourse_models::{AccountId, AssetId, ModelsError, ObjectId, PropertyId};
use displaydoc::Display;
use thiserror::Error;

/// state error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// property {0:?} holds an unexpected value: {1}
    PropertyDecodeError(PropertyId, String),
    /// identifier space of {0:?} is exhausted
    IdOverflow(PropertyId),
    /// unknown object: {0}
    UnknownObject(ObjectId),
    /// unknown account: {0}
    UnknownAccount(AccountId),
    /// unknown asset: {0}
    UnknownAsset(AssetId),
    /// unknown asset symbol: {0}
    UnknownSymbol(String),
    /// object {0} does not resolve to an owner condition
    NoOwnerCondition(ObjectId),
    /// ownership of object {0} loops back on itself
    CircularOwnership(ObjectId),
    /// ownership of object {0} is more than {1} levels deep
    OwnershipTooDeep(ObjectId, usize),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
}
