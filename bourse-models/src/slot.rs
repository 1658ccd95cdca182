// Copyright (c) 2024 BOURSE LABS

use crate::account::AccountId;
use bourse_hash::Hash;
use bourse_time::BourseTime;
use serde::{Deserialize, Serialize};

/// Block production slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotIndex {
    /// scheduled block time
    pub timestamp: BourseTime,
    /// delegate scheduled to produce
    pub delegate_id: AccountId,
}

/// Outcome of a production slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    #[allow(missing_docs)]
    pub index: SlotIndex,
    /// produced block, `None` when the slot was missed
    pub block_id: Option<Hash>,
}
