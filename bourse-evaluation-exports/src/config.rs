// Copyright (c) 2024 BOURSE LABS

//! This module provides the structures used to provide configuration parameters to the evaluation system

use bourse_models::config::constants::{
    LONG_SYMBOL_REGISTRATION_FEE, MAX_MARKET_FEE_RATE, MAX_OPERATIONS_PER_TRANSACTION,
    MAX_PRECISION, MAX_SHARES, MAX_SHORT_INTEREST_RATIO, MAX_SHORT_PERIOD,
    MAX_TRANSACTION_EXPIRATION, OWNER_DEPENDENCY_MAX_DEPTH, PRICE_ONE, SHORT_SYMBOL_MAX_SIZE,
    SHORT_SYMBOL_REGISTRATION_FEE,
};
use bourse_models::ShareAmount;
use bourse_time::BourseTime;
use serde::Deserialize;

/// Evaluation module configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// cap on the max supply of any asset
    pub max_shares: ShareAmount,
    /// largest accepted precision
    pub max_precision: u64,
    /// registration fee for symbols longer than `short_symbol_max_size`
    pub long_symbol_registration_fee: ShareAmount,
    /// registration fee for short symbols
    pub short_symbol_registration_fee: ShareAmount,
    /// symbols up to this length pay the short symbol fee
    pub short_symbol_max_size: usize,
    /// maximum market fee rate, in basis points
    pub max_market_fee_rate: u16,
    /// lifetime of a margin position
    pub max_short_period: BourseTime,
    /// short interest rates must stay below this integer multiple of one
    pub max_short_interest_multiplier: u64,
    /// maximum number of hops followed to resolve the owner of an object
    pub owner_dependency_max_depth: usize,
    /// maximum number of operations in a transaction
    pub max_operations_per_transaction: u32,
    /// maximum lifetime of a transaction
    pub max_transaction_expiration: BourseTime,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            max_shares: MAX_SHARES,
            max_precision: MAX_PRECISION,
            long_symbol_registration_fee: LONG_SYMBOL_REGISTRATION_FEE,
            short_symbol_registration_fee: SHORT_SYMBOL_REGISTRATION_FEE,
            short_symbol_max_size: SHORT_SYMBOL_MAX_SIZE,
            max_market_fee_rate: MAX_MARKET_FEE_RATE,
            max_short_period: MAX_SHORT_PERIOD,
            max_short_interest_multiplier: (MAX_SHORT_INTEREST_RATIO / PRICE_ONE) as u64,
            owner_dependency_max_depth: OWNER_DEPENDENCY_MAX_DEPTH,
            max_operations_per_transaction: MAX_OPERATIONS_PER_TRANSACTION,
            max_transaction_expiration: MAX_TRANSACTION_EXPIRATION,
        }
    }
}

impl EvaluationConfig {
    /// Fee charged for registering `symbol`, in core asset shares
    pub fn registration_fee(&self, symbol: &str) -> ShareAmount {
        if symbol.len() <= self.short_symbol_max_size {
            self.short_symbol_registration_fee
        } else {
            self.long_symbol_registration_fee
        }
    }

    /// Exclusive upper bound of a short interest rate ratio
    pub fn max_short_interest_ratio(&self) -> u128 {
        u128::from(self.max_short_interest_multiplier) << 64
    }
}
