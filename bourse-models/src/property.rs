// Copyright (c) 2024 BOURSE LABS

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// Chain metadata slots. Ids are append-only.
#[derive(
    IntoPrimitive,
    TryFromPrimitive,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum PropertyId {
    /// version of the state schema
    DatabaseVersion = 0,
    /// chain identifier digest
    ChainId = 1,
    /// last allocated asset id
    LastAssetId = 2,
    /// last allocated account id
    LastAccountId = 3,
    /// ids of the active delegates
    ActiveDelegateListId = 4,
    /// last random seed
    LastRandomSeedId = 5,
    /// whether statistics are tracked
    StatisticsEnabled = 6,
    /// blocks to wait before a block is considered confirmed
    ConfirmationRequirement = 7,
    /// markets that need matching
    DirtyMarkets = 8,
    /// last allocated game id
    LastGameId = 9,
    /// last allocated object id
    LastObjectId = 10,
}

/// A property value. Values are opaque to the storage layer, typed accessors live with the state helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[allow(missing_docs)]
    pub id: PropertyId,
    #[allow(missing_docs)]
    pub value: serde_json::Value,
}
