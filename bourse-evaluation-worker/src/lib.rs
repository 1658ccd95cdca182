// Copyright (c) 2024 BOURSE LABS

//! # General description
//!
//! This crate implements the evaluation rules of Bourse transactions: asset
//! registration and issuance, the order books, margin positions, game chips and
//! balance records.
//!
//! The `TransactionEvaluator` is the entry point. It evaluates the operations of a
//! transaction in order against a transaction layer of the chain state, checks that
//! the transaction ledger settles, and commits the layer only if everything passed.
//!
//! # Architecture
//!
//! ## evaluator.rs
//! Checks the transaction envelope, dispatches operations to their rules and
//! resets the state to a snapshot taken before the failing operation.
//!
//! ## context.rs
//! Defines the `TransactionEvaluationState`: the transaction layer of the state,
//! the signers, and the per-asset ledger every operation credits or debits.
//!
//! ## asset_operations.rs
//! Rules for creating, issuing and updating assets.
//!
//! ## market_operations.rs
//! Rules for bids, asks, shorts, covers, collateral and chips.
//!
//! ## balance_operations.rs
//! Rules for moving funds in and out of balance records.
//!
//! ## registry.rs
//! Registry of the evaluators of custom operation types.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod asset_operations;
mod balance_operations;
mod context;
mod evaluator;
mod market_operations;
mod registry;

pub use context::{EvaluationSnapshot, TransactionEvaluationState};
pub use evaluator::TransactionEvaluator;
pub use registry::{CustomEvaluator, EvaluatorRegistry, EvaluatorRegistryBuilder};

#[cfg(test)]
mod tests;
