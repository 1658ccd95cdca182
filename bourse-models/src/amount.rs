// Copyright (c) 2024 BOURSE LABS

//! Share amounts: signed fixed-point integers scaled by the precision of their asset

use crate::asset::AssetId;
use crate::error::ModelsError;
use bourse_serialization::{
    Deserializer, I64VarIntDeserializer, I64VarIntSerializer, SerializeError, Serializer,
    U32VarIntDeserializer, U32VarIntSerializer,
};
use nom::error::{context, ContextError, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// Raw quantity of shares of an asset
pub type ShareAmount = i64;

/// An amount of shares tagged with the asset it is denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Asset {
    /// raw share amount
    pub amount: ShareAmount,
    /// denomination
    pub asset_id: AssetId,
}

impl Asset {
    /// Creates an amount of `asset_id`
    pub const fn new(amount: ShareAmount, asset_id: AssetId) -> Self {
        Asset { amount, asset_id }
    }
}

impl std::ops::Neg for Asset {
    type Output = Asset;

    fn neg(self) -> Asset {
        Asset::new(self.amount.saturating_neg(), self.asset_id)
    }
}

/// Number of decimals represented by `precision`, if it is a power of ten
fn precision_scale(precision: u64) -> Option<u32> {
    if precision == 0 {
        return None;
    }
    let mut scale = 0;
    let mut value = precision;
    while value % 10 == 0 {
        value /= 10;
        scale += 1;
    }
    (value == 1).then_some(scale)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Human readable amount, like `1,234.50000 XYZ` for a precision of 10^5
///
/// ```
/// # use bourse_models::amount::format_share_amount;
/// assert_eq!(format_share_amount(123_450_000, 100_000, "XYZ").unwrap(), "1,234.50000 XYZ");
/// assert_eq!(format_share_amount(-5, 100, "ABC").unwrap(), "-0.05 ABC");
/// ```
pub fn format_share_amount(
    amount: ShareAmount,
    precision: u64,
    symbol: &str,
) -> Result<String, ModelsError> {
    let scale = precision_scale(precision).ok_or_else(|| {
        ModelsError::AmountParseError(format!("precision {} is not a power of ten", precision))
    })?;
    let magnitude = Decimal::from_i128_with_scale(i128::from(amount).abs(), scale).to_string();
    let (integer, fraction) = match magnitude.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (magnitude.as_str(), None),
    };
    let mut res = String::new();
    if amount < 0 {
        res.push('-');
    }
    res.push_str(&group_thousands(integer));
    if let Some(fraction) = fraction {
        res.push('.');
        res.push_str(fraction);
    }
    res.push(' ');
    res.push_str(symbol);
    Ok(res)
}

/// Raw share amount from a decimal string, extra digits beyond `precision` are truncated
///
/// ```
/// # use bourse_models::amount::parse_share_amount;
/// assert_eq!(parse_share_amount("100.500019", 100_000).unwrap(), 10_050_001);
/// assert_eq!(parse_share_amount("-1,000", 100).unwrap(), -100_000);
/// assert!(parse_share_amount("abc", 100).is_err());
/// ```
pub fn parse_share_amount(str_amount: &str, precision: u64) -> Result<ShareAmount, ModelsError> {
    let scale = precision_scale(precision).ok_or_else(|| {
        ModelsError::AmountParseError(format!("precision {} is not a power of ten", precision))
    })?;
    let cleaned: String = str_amount.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(cleaned.trim())
        .map_err(|err| ModelsError::AmountParseError(err.to_string()))?
        .round_dp_with_strategy(scale, RoundingStrategy::ToZero)
        .checked_mul(Decimal::from(precision))
        .and_then(|res| res.to_i64())
        .ok_or_else(|| ModelsError::AmountParseError("amount is too large".to_string()))
}

/// Serializer for `Asset`
#[derive(Default, Clone)]
pub struct AssetAmountSerializer {
    amount_serializer: I64VarIntSerializer,
    id_serializer: U32VarIntSerializer,
}

impl AssetAmountSerializer {
    /// Creates a new `AssetAmountSerializer`
    pub const fn new() -> Self {
        Self {
            amount_serializer: I64VarIntSerializer::new(),
            id_serializer: U32VarIntSerializer::new(),
        }
    }
}

impl Serializer<Asset> for AssetAmountSerializer {
    fn serialize(&self, value: &Asset, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.amount_serializer.serialize(&value.amount, buffer)?;
        self.id_serializer.serialize(&value.asset_id, buffer)
    }
}

/// Deserializer for `Asset`
#[derive(Clone)]
pub struct AssetAmountDeserializer {
    amount_deserializer: I64VarIntDeserializer,
    id_deserializer: U32VarIntDeserializer,
}

impl AssetAmountDeserializer {
    /// Creates a new `AssetAmountDeserializer`
    pub const fn new() -> Self {
        Self {
            amount_deserializer: I64VarIntDeserializer::new(
                Included(i64::MIN),
                Included(i64::MAX),
            ),
            id_deserializer: U32VarIntDeserializer::new(Included(0), Included(u32::MAX)),
        }
    }
}

impl Default for AssetAmountDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Asset> for AssetAmountDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Asset, E> {
        context(
            "Failed Asset deserialization",
            tuple((
                context("Failed amount deserialization", |input| {
                    self.amount_deserializer.deserialize(input)
                }),
                context("Failed asset_id deserialization", |input| {
                    self.id_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(amount, asset_id)| Asset::new(amount, asset_id))
        .parse(buffer)
    }
}
