// Copyright (c) 2024 BOURSE LABS

//! # General description
//!
//! This crate implements the layered chain state the evaluation rules run against.
//!
//! # Architecture
//!
//! ## `base_state.rs`
//! Defines the `BaseState` holding the committed records, with secondary indices
//! for lookups by symbol, name and owner address, and ordered books per market.
//!
//! ## `pending_state.rs`
//! Defines the `PendingState`, a copy-on-write layer over any `ChainState`.
//! Layers nest: a transaction layer sits over a block layer which sits over the base.
//! Committing a layer applies its `StateChanges` to its parent, dropping it discards them.
//!
//! ## Test exports
//!
//! When the crate feature `test-exports` is enabled, a `GenesisBuilder` is exported.
//! See `test_exports/mod.rs` for details.

#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod base_state;
mod pending_state;

pub use base_state::BaseState;
pub use pending_state::PendingState;

#[cfg(test)]
mod tests;

#[cfg(any(test, feature = "test-exports"))]
pub mod test_exports;
