// Copyright (c) 2024 BOURSE LABS

//! Exchange rates between two assets.
//!
//! A price is a 64.64 fixed-point ratio of quote shares per base share. All
//! products and quotients with share amounts are computed on arbitrary
//! precision integers and rounded down, so every node agrees on the result.

use crate::amount::{Asset, ShareAmount};
use crate::asset::AssetId;
use crate::config::constants::PRICE_ONE;
use crate::error::ModelsError;
use bourse_serialization::{
    Deserializer, SerializeError, Serializer, U128VarIntDeserializer, U128VarIntSerializer,
    U32VarIntDeserializer, U32VarIntSerializer,
};
use nom::error::{context, ContextError, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use num::{BigUint, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::ops::Bound::Included;

/// Quote shares per base share.
///
/// Ordering is by market first (quote id, then base id) and then by ratio, which
/// makes every order book a contiguous range of the market index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price {
    /// quote side of the market
    pub quote_asset_id: AssetId,
    /// base side of the market
    pub base_asset_id: AssetId,
    /// 64.64 fixed-point ratio
    pub ratio: u128,
}

fn to_share_amount(value: BigUint) -> Result<ShareAmount, ModelsError> {
    value
        .to_i64()
        .ok_or_else(|| ModelsError::CheckedOperationError("share amount overflow".to_string()))
}

fn non_negative(amount: ShareAmount) -> Result<BigUint, ModelsError> {
    u64::try_from(amount).map(BigUint::from).map_err(|_| {
        ModelsError::CheckedOperationError(format!("negative amount {} in price product", amount))
    })
}

impl Price {
    /// Creates a price from its raw fixed-point ratio
    pub const fn new(ratio: u128, quote_asset_id: AssetId, base_asset_id: AssetId) -> Self {
        Price {
            quote_asset_id,
            base_asset_id,
            ratio,
        }
    }

    /// Price at which `base` exchanges for `quote`, rounded down
    ///
    /// ```
    /// # use bourse_models::{amount::Asset, price::Price};
    /// let price = Price::from_amounts(Asset::new(3, 1), Asset::new(2, 0)).unwrap();
    /// assert_eq!(price.ratio, 3 << 63);
    /// ```
    pub fn from_amounts(quote: Asset, base: Asset) -> Result<Price, ModelsError> {
        if base.amount <= 0 {
            return Err(ModelsError::InvalidPrice(format!(
                "base amount must be positive, got {}",
                base.amount
            )));
        }
        let numerator = non_negative(quote.amount)? << 64usize;
        let ratio = (numerator / non_negative(base.amount)?)
            .to_u128()
            .ok_or_else(|| ModelsError::InvalidPrice("ratio overflow".to_string()))?;
        Ok(Price::new(ratio, quote.asset_id, base.asset_id))
    }

    /// Whether the ratio is zero
    pub fn is_zero(&self) -> bool {
        self.ratio == 0
    }

    /// Whether both prices belong to the same market
    pub fn same_market(&self, other: &Price) -> bool {
        self.quote_asset_id == other.quote_asset_id && self.base_asset_id == other.base_asset_id
    }

    /// Sum of two prices of the same market
    pub fn checked_add(&self, other: &Price) -> Result<Price, ModelsError> {
        if !self.same_market(other) {
            return Err(ModelsError::InvalidPrice(format!(
                "can not add prices of markets {}/{} and {}/{}",
                self.quote_asset_id,
                self.base_asset_id,
                other.quote_asset_id,
                other.base_asset_id
            )));
        }
        let ratio = self
            .ratio
            .checked_add(other.ratio)
            .ok_or_else(|| ModelsError::InvalidPrice("ratio overflow".to_string()))?;
        Ok(Price::new(ratio, self.quote_asset_id, self.base_asset_id))
    }

    /// `floor(amount × ratio)`, the ratio being used as a plain scalar
    pub fn mul_floor(&self, amount: ShareAmount) -> Result<ShareAmount, ModelsError> {
        to_share_amount((non_negative(amount)? * BigUint::from(self.ratio)) >> 64usize)
    }

    /// Converts an amount of one side of the market into the other side, rounded down
    ///
    /// ```
    /// # use bourse_models::{amount::Asset, price::Price};
    /// // 2 quote (id 1) per base (id 0)
    /// let price = Price::new(2 << 64, 1, 0);
    /// assert_eq!(price.convert(Asset::new(10, 0)).unwrap(), Asset::new(20, 1));
    /// assert_eq!(price.convert(Asset::new(7, 1)).unwrap(), Asset::new(3, 0));
    /// ```
    pub fn convert(&self, amount: Asset) -> Result<Asset, ModelsError> {
        if amount.asset_id == self.base_asset_id {
            Ok(Asset::new(self.mul_floor(amount.amount)?, self.quote_asset_id))
        } else if amount.asset_id == self.quote_asset_id {
            if self.ratio == 0 {
                return Err(ModelsError::InvalidPrice("division by a zero price".to_string()));
            }
            let quotient = (non_negative(amount.amount)? << 64usize) / BigUint::from(self.ratio);
            Ok(Asset::new(to_share_amount(quotient)?, self.base_asset_id))
        } else {
            Err(ModelsError::InvalidPrice(format!(
                "asset {} is not part of market {}/{}",
                amount.asset_id, self.quote_asset_id, self.base_asset_id
            )))
        }
    }

    /// Decimal rendering of the ratio, 18 fractional digits
    pub fn ratio_string(&self) -> String {
        let integer = self.ratio >> 64;
        let fraction: BigUint = (BigUint::from(self.ratio & (PRICE_ONE - 1))
            * BigUint::from(1_000_000_000_000_000_000u64))
            >> 64usize;
        if fraction.is_zero() {
            integer.to_string()
        } else {
            let digits = format!("{:0>18}", fraction.to_string());
            format!("{}.{}", integer, digits.trim_end_matches('0'))
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} / {}",
            self.ratio_string(),
            self.quote_asset_id,
            self.base_asset_id
        )
    }
}

/// Serializer for `Price`
#[derive(Default, Clone)]
pub struct PriceSerializer {
    ratio_serializer: U128VarIntSerializer,
    id_serializer: U32VarIntSerializer,
}

impl PriceSerializer {
    /// Creates a new `PriceSerializer`
    pub const fn new() -> Self {
        Self {
            ratio_serializer: U128VarIntSerializer::new(),
            id_serializer: U32VarIntSerializer::new(),
        }
    }
}

impl Serializer<Price> for PriceSerializer {
    fn serialize(&self, value: &Price, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.ratio_serializer.serialize(&value.ratio, buffer)?;
        self.id_serializer.serialize(&value.quote_asset_id, buffer)?;
        self.id_serializer.serialize(&value.base_asset_id, buffer)
    }
}

/// Deserializer for `Price`
#[derive(Clone)]
pub struct PriceDeserializer {
    ratio_deserializer: U128VarIntDeserializer,
    id_deserializer: U32VarIntDeserializer,
}

impl PriceDeserializer {
    /// Creates a new `PriceDeserializer`
    pub const fn new() -> Self {
        Self {
            ratio_deserializer: U128VarIntDeserializer::new(Included(0), Included(u128::MAX)),
            id_deserializer: U32VarIntDeserializer::new(Included(0), Included(u32::MAX)),
        }
    }
}

impl Default for PriceDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Price> for PriceDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Price, E> {
        context(
            "Failed Price deserialization",
            tuple((
                context("Failed ratio deserialization", |input| {
                    self.ratio_deserializer.deserialize(input)
                }),
                context("Failed quote_asset_id deserialization", |input| {
                    self.id_deserializer.deserialize(input)
                }),
                context("Failed base_asset_id deserialization", |input| {
                    self.id_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(ratio, quote_asset_id, base_asset_id)| {
            Price::new(ratio, quote_asset_id, base_asset_id)
        })
        .parse(buffer)
    }
}
