// Copyright (c) 2024 BOURSE LABS

//! # Overview
//!
//! This crate provides the types shared between the transaction evaluator
//! (bourse-evaluation-worker crate) and the code feeding it transactions.
//!
//! # Usage
//!
//! A block producer builds an `EvaluationConfig`, usually from the defaults or
//! from a settings file, hands it to the evaluator, then submits `Transaction`s.
//! Every evaluation ends with either a `TransactionOutput` or an `EvaluationError`
//! whose `category()` tells the caller how to report the rejection.
//!
//! # Architecture
//!
//! ## config.rs
//! Contains configuration parameters for the evaluation rules.
//!
//! ## error.rs
//! Defines the flat error type of the evaluation and its categories.
//!
//! ## transaction.rs
//! Defines the transaction, its binary encoding and the evaluation output.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod config;
mod error;
mod transaction;

pub use config::EvaluationConfig;
pub use error::{ErrorCategory, EvaluationError};
pub use transaction::{
    Transaction, TransactionDeserializer, TransactionOutput, TransactionSerializer,
};
