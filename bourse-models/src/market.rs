// Copyright (c) 2024 BOURSE LABS

//! Order book and margin position model

use crate::address::{Address, AddressDeserializer, AddressSerializer};
use crate::amount::{Asset, ShareAmount};
use crate::error::ModelsError;
use crate::price::{Price, PriceDeserializer, PriceSerializer};
use bourse_hash::Hash;
use bourse_serialization::{Deserializer, SerializeError, Serializer};
use bourse_time::BourseTime;
use nom::error::{context, ContextError, ParseError};
use nom::sequence::tuple;
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};

/// Sort key of resting orders: by price (market first, then ratio), then by owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarketIndexKey {
    #[allow(missing_docs)]
    pub order_price: Price,
    #[allow(missing_docs)]
    pub owner: Address,
}

impl MarketIndexKey {
    #[allow(missing_docs)]
    pub const fn new(order_price: Price, owner: Address) -> Self {
        MarketIndexKey { order_price, owner }
    }
}

/// Book an order record rests in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    /// balance in quote asset, buying base
    Bid,
    /// balance in base asset, selling it
    Ask,
    /// collateral in base asset, offered to borrow newly issued quote asset
    Short,
}

/// Resting order state. A zero balance means the order does not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// remaining quantity, denominated per order side
    pub balance: ShareAmount,
    /// price beyond which the order must not fill (shorts)
    pub limit_price: Option<Price>,
    /// time of the last mutation
    pub last_update: BourseTime,
}

impl OrderRecord {
    #[allow(missing_docs)]
    pub fn is_null(&self) -> bool {
        self.balance == 0
    }
}

/// Open margin position, indexed by its call price
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralRecord {
    /// base asset locked as collateral
    pub collateral_balance: ShareAmount,
    /// outstanding quote asset debt
    pub payoff_balance: ShareAmount,
    /// yearly interest rate on the debt
    pub interest_rate: Price,
    /// time at which the position is force-closed
    pub expiration: BourseTime,
}

impl CollateralRecord {
    #[allow(missing_docs)]
    pub fn is_null(&self) -> bool {
        self.collateral_balance == 0 && self.payoff_balance == 0
    }

    /// Call price of the position: `payoff_balance / (2/3 · collateral_balance)`
    ///
    /// ```
    /// # use bourse_models::market::CollateralRecord;
    /// let position = CollateralRecord {
    ///     collateral_balance: 300,
    ///     payoff_balance: 100,
    ///     ..Default::default()
    /// };
    /// // 100 quote for 200 base
    /// assert_eq!(position.call_price(1, 0).unwrap().ratio, 1 << 63);
    /// ```
    pub fn call_price(
        &self,
        quote_asset_id: crate::asset::AssetId,
        base_asset_id: crate::asset::AssetId,
    ) -> Result<Price, ModelsError> {
        let backing = self
            .collateral_balance
            .checked_mul(2)
            .ok_or_else(|| ModelsError::CheckedOperationError("collateral overflow".to_string()))?
            / 3;
        if backing <= 0 {
            return Err(ModelsError::InvalidPrice(format!(
                "collateral {} can not back a position",
                self.collateral_balance
            )));
        }
        Price::from_amounts(
            Asset::new(self.payoff_balance, quote_asset_id),
            Asset::new(backing, base_asset_id),
        )
    }
}

/// Kind of a market order as exposed to readers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    #[allow(missing_docs)]
    Null,
    #[allow(missing_docs)]
    Bid,
    #[allow(missing_docs)]
    Ask,
    #[allow(missing_docs)]
    Short,
    #[allow(missing_docs)]
    Cover,
    /// bid priced relatively to a feed
    RelativeBid,
    /// ask priced relatively to a feed
    RelativeAsk,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderType::Null => "null_order",
            OrderType::Bid => "bid_order",
            OrderType::Ask => "ask_order",
            OrderType::Short => "short_order",
            OrderType::Cover => "cover_order",
            OrderType::RelativeBid => "relative_bid_order",
            OrderType::RelativeAsk => "relative_ask_order",
        };
        write!(f, "{}", name)
    }
}

impl From<OrderKind> for OrderType {
    fn from(kind: OrderKind) -> Self {
        match kind {
            OrderKind::Bid => OrderType::Bid,
            OrderKind::Ask => OrderType::Ask,
            OrderKind::Short => OrderType::Short,
        }
    }
}

/// Read-only view over an order or a margin position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOrder {
    #[allow(missing_docs)]
    pub order_type: OrderType,
    #[allow(missing_docs)]
    pub market_index: MarketIndexKey,
    /// balance and limit, for covers the balance is the debt
    pub state: OrderRecord,
    /// locked collateral (shorts and covers)
    pub collateral: Option<ShareAmount>,
    /// interest rate (shorts and covers)
    pub interest_rate: Option<Price>,
    /// expiration (covers)
    pub expiration: Option<BourseTime>,
}

impl MarketOrder {
    /// View over a resting bid, ask or short
    pub fn from_order(kind: OrderKind, market_index: MarketIndexKey, state: OrderRecord) -> Self {
        let interest_rate = (kind == OrderKind::Short).then_some(market_index.order_price);
        MarketOrder {
            order_type: kind.into(),
            market_index,
            state,
            collateral: None,
            interest_rate,
            expiration: None,
        }
    }

    /// View over a margin position
    pub fn from_collateral(market_index: MarketIndexKey, position: &CollateralRecord) -> Self {
        MarketOrder {
            order_type: OrderType::Cover,
            market_index,
            state: OrderRecord {
                balance: position.payoff_balance,
                limit_price: None,
                last_update: BourseTime::default(),
            },
            collateral: Some(position.collateral_balance),
            interest_rate: Some(position.interest_rate),
            expiration: Some(position.expiration),
        }
    }

    /// Hash of the type, price and owner of the order
    pub fn id(&self) -> Hash {
        let price = &self.market_index.order_price;
        Hash::compute_from_tuple(&[
            self.order_type.to_string().as_bytes(),
            &price.ratio.to_be_bytes(),
            &price.quote_asset_id.to_be_bytes(),
            &price.base_asset_id.to_be_bytes(),
            self.market_index.owner.to_bytes(),
        ])
    }

    /// Short display identifier, like `BID-3xk9Qa2L`
    pub fn small_id(&self) -> String {
        let type_name = self.order_type.to_string();
        let prefix = type_name.split('_').next().unwrap_or_default().to_uppercase();
        let id: String = self.id().to_bs58_check().chars().take(8).collect();
        format!("{}-{}", prefix, id)
    }

    #[allow(missing_docs)]
    pub fn owner(&self) -> Address {
        self.market_index.owner
    }

    #[allow(missing_docs)]
    pub fn limit_price(&self) -> Option<Price> {
        self.state.limit_price
    }

    /// Funds available to the order, in the asset of its side
    pub fn get_balance(&self) -> Result<Asset, ModelsError> {
        let price = &self.market_index.order_price;
        let asset_id = match self.order_type {
            OrderType::Bid | OrderType::RelativeBid | OrderType::Cover => price.quote_asset_id,
            OrderType::Ask | OrderType::RelativeAsk | OrderType::Short => price.base_asset_id,
            OrderType::Null => {
                return Err(ModelsError::InvalidOrderType("null order".to_string()))
            }
        };
        Ok(Asset::new(self.state.balance, asset_id))
    }

    /// Effective price. Relative orders are offset by `relative` when one is given.
    pub fn get_price(&self, relative: Option<&Price>) -> Result<Price, ModelsError> {
        match (self.order_type, relative) {
            (OrderType::Null, _) => Err(ModelsError::InvalidOrderType("null order".to_string())),
            (OrderType::RelativeBid | OrderType::RelativeAsk, Some(offset)) => {
                self.market_index.order_price.checked_add(offset)
            }
            _ => Ok(self.market_index.order_price),
        }
    }

    /// Quantity of base asset the order trades
    pub fn get_quantity(&self, relative: Option<&Price>) -> Result<Asset, ModelsError> {
        match self.order_type {
            OrderType::Bid | OrderType::RelativeBid => {
                self.get_price(relative)?.convert(self.get_balance()?)
            }
            OrderType::Ask | OrderType::RelativeAsk | OrderType::Short => self.get_balance(),
            other => Err(ModelsError::InvalidOrderType(other.to_string())),
        }
    }

    /// Quantity of quote asset the order trades
    pub fn get_quote_quantity(&self, relative: Option<&Price>) -> Result<Asset, ModelsError> {
        match self.order_type {
            OrderType::Bid | OrderType::RelativeBid => self.get_balance(),
            OrderType::Ask | OrderType::RelativeAsk | OrderType::Short => {
                self.get_price(relative)?.convert(self.get_balance()?)
            }
            other => Err(ModelsError::InvalidOrderType(other.to_string())),
        }
    }
}

/// Serializer for `MarketIndexKey`
#[derive(Default, Clone)]
pub struct MarketIndexKeySerializer {
    price_serializer: PriceSerializer,
    address_serializer: AddressSerializer,
}

impl MarketIndexKeySerializer {
    /// Creates a new `MarketIndexKeySerializer`
    pub const fn new() -> Self {
        Self {
            price_serializer: PriceSerializer::new(),
            address_serializer: AddressSerializer::new(),
        }
    }
}

impl Serializer<MarketIndexKey> for MarketIndexKeySerializer {
    fn serialize(&self, value: &MarketIndexKey, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.price_serializer.serialize(&value.order_price, buffer)?;
        self.address_serializer.serialize(&value.owner, buffer)
    }
}

/// Deserializer for `MarketIndexKey`
#[derive(Default, Clone)]
pub struct MarketIndexKeyDeserializer {
    price_deserializer: PriceDeserializer,
    address_deserializer: AddressDeserializer,
}

impl MarketIndexKeyDeserializer {
    /// Creates a new `MarketIndexKeyDeserializer`
    pub const fn new() -> Self {
        Self {
            price_deserializer: PriceDeserializer::new(),
            address_deserializer: AddressDeserializer::new(),
        }
    }
}

impl Deserializer<MarketIndexKey> for MarketIndexKeyDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], MarketIndexKey, E> {
        context(
            "Failed MarketIndexKey deserialization",
            tuple((
                context("Failed order_price deserialization", |input| {
                    self.price_deserializer.deserialize(input)
                }),
                context("Failed owner deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(order_price, owner)| MarketIndexKey::new(order_price, owner))
        .parse(buffer)
    }
}
