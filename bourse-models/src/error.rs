// Copyright (c) 2024 BOURSE LABS

use displaydoc::Display;
use thiserror::Error;

/// models result
pub type ModelsResult<T, E = ModelsError> = core::result::Result<T, E>;

/// models error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelsError {
    /// Serialization error: {0}
    SerializeError(String),
    /// Deserialization error: {0}
    DeserializeError(String),
    /// `bourse_hash` error: {0}
    HashError(String),
    /// time error: {0}
    TimeError(#[from] bourse_time::TimeError),
    /// Amount parse error: {0}
    AmountParseError(String),
    /// Checked operation error: {0}
    CheckedOperationError(String),
    /// invalid price: {0}
    InvalidPrice(String),
    /// invalid order type: {0}
    InvalidOrderType(String),
    /// Wrong prefix for address: expected {0}, got {1}
    WrongPrefix(String, String),
}

impl From<bourse_hash::BourseHashError> for ModelsError {
    fn from(err: bourse_hash::BourseHashError) -> Self {
        ModelsError::HashError(err.to_string())
    }
}
