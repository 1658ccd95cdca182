// Copyright (c) 2024 BOURSE LABS

//! # General description
//!
//! Contract between the evaluation rules and the chain records they read and write.
//!
//! `ChainState` is the accessor every state layer implements. `ChainStateExt` adds
//! typed helpers on top of it (property accessors, identifier allocators, amount display
//! and object ownership resolution). `StateChanges` is what a pending layer accumulates
//! and hands to its parent on commit.

#![warn(missing_docs)]

mod controller;
mod error;
mod ext;
mod state_changes;
mod types;

pub use controller::ChainState;
#[cfg(any(test, feature = "test-exports"))]
pub use controller::MockChainState;
pub use error::StateError;
pub use ext::{ChainStateExt, MarketSet};
pub use state_changes::{get_or_else, StateChanges};
pub use types::{Applicable, SetOrDelete, SetOrKeep};
