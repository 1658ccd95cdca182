// Copyright (c) 2024 BOURSE LABS

//! Records, operations and value types of the Bourse chain, along with their binary encoding.

#![warn(missing_docs)]

pub use account::{AccountId, AccountRecord};
pub use address::Address;
pub use amount::{Asset, ShareAmount};
pub use asset::{AssetFlag, AssetFlags, AssetId, AssetIssuer, AssetRecord};
pub use authority::MultisigCondition;
pub use balance::{BalanceId, BalanceRecord, WithdrawCondition};
pub use error::{ModelsError, ModelsResult};
pub use feed::{FeedIndex, FeedRecord};
pub use game::{GameId, GameRecord};
pub use market::{CollateralRecord, MarketIndexKey, MarketOrder, OrderKind, OrderRecord, OrderType};
pub use object::{ObjectId, ObjectKind, ObjectRecord};
pub use operation::OperationType;
pub use price::Price;
pub use property::{PropertyId, PropertyRecord};
pub use slot::{SlotIndex, SlotRecord};

/// accounts and their naming rules
pub mod account;
pub mod address;
pub mod amount;
/// assets, issuers and flags
pub mod asset;
pub mod authority;
pub mod balance;
/// chain constants and settings loading
pub mod config;
/// models error
pub mod error;
/// delegate price feeds
pub mod feed;
/// games
pub mod game;
/// order book records
pub mod market;
/// generic objects
pub mod object;
pub mod operation;
/// prices
pub mod price;
/// chain properties
pub mod property;
/// production slots
pub mod slot;
