// Copyright (c) 2024 BOURSE LABS

//! DEFAULT VALUES USED TO INITIALIZE THE LEDGER RULES
//!
//! These values are part of consensus: every node must use the same ones,
//! changing any of them is a hard fork. They are passed with dependency
//! injection through the evaluation `cfg` structures, which is convenient for
//! unit tests that want to lower a limit.

use crate::asset::AssetId;
use bourse_time::BourseTime;

/// String prepended to the bs58 representation of an address
pub const ADDRESS_PREFIX: &str = "BRS";
/// Symbol of the core asset
pub const BASE_ASSET_SYMBOL: &str = "BRS";
/// Id of the core asset, used to pay fees and to back chips
pub const BASE_ASSET_ID: AssetId = 0;
/// Precision of the core asset
pub const BLOCKCHAIN_PRECISION: i64 = 100_000;

/// Maximum amount that can be issued for any asset: 10^15 keeps every share value exact as a double
pub const MAX_SHARES: i64 = 1_000_000_000_000_000;
/// Largest accepted precision (10^15)
pub const MAX_PRECISION: u64 = 1_000_000_000_000_000;

/// Minimum length of an account name
pub const MIN_NAME_SIZE: usize = 1;
/// Maximum length of an account name
pub const MAX_NAME_SIZE: usize = 63;
/// Maximum size of free-form data attached to a record (description, public data)
pub const MAX_NAME_DATA_SIZE: u64 = 64 * 1024;

/// Minimum length of an asset symbol
pub const MIN_SYMBOL_SIZE: usize = 3;
/// Maximum length of a hierarchical asset symbol, dot included
pub const MAX_SYMBOL_SIZE: usize = 12;
/// Maximum length of a primary symbol or of a sub-symbol
pub const MAX_SUB_SYMBOL_SIZE: usize = 8;
/// Symbols can not start with this prefix
pub const RESERVED_SYMBOL_PREFIX: &str = "BIT";

/// Registration fee for symbols longer than `SHORT_SYMBOL_MAX_SIZE`
pub const LONG_SYMBOL_REGISTRATION_FEE: i64 = 500 * BLOCKCHAIN_PRECISION;
/// Registration fee for short symbols
pub const SHORT_SYMBOL_REGISTRATION_FEE: i64 = 1000 * LONG_SYMBOL_REGISTRATION_FEE;
/// Symbols up to this length pay the short symbol fee
pub const SHORT_SYMBOL_MAX_SIZE: usize = 5;

/// Maximum market fee rate of a user issued asset, in basis points
pub const MAX_MARKET_FEE_RATE: u16 = 10_000;

/// Duration of a short position before it expires
pub const MAX_SHORT_PERIOD: BourseTime = BourseTime::from_secs(30 * 24 * 60 * 60);
/// Seconds in a (365 days) year, used for interest accrual
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;
/// Fixed-point one of a price ratio (64 fractional bits)
pub const PRICE_ONE: u128 = 1 << 64;
/// Short interest rate ratios must stay strictly below this value (1000% APR)
pub const MAX_SHORT_INTEREST_RATIO: u128 = 10 << 64;

/// Number of active delegates
pub const NUM_DELEGATES: u32 = 101;
/// Maximum lifetime of a transaction
pub const MAX_TRANSACTION_EXPIRATION: BourseTime = BourseTime::from_secs(2 * 24 * 60 * 60);

/// Maximum number of hops followed to resolve the owner of an object
pub const OWNER_DEPENDENCY_MAX_DEPTH: usize = 8;
/// Version of the state schema
pub const DATABASE_VERSION: u64 = 13;

/// Maximum number of operations in a transaction
pub const MAX_OPERATIONS_PER_TRANSACTION: u32 = 1024;
/// Maximum number of owners of a multisig condition
pub const MAX_MULTISIG_OWNERS: u32 = 64;
/// Maximum size of the payload of a custom operation
pub const MAX_CUSTOM_PAYLOAD_SIZE: u64 = 64 * 1024;
