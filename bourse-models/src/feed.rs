// Copyright (c) 2024 BOURSE LABS

use crate::account::AccountId;
use crate::asset::AssetId;
use bourse_time::BourseTime;
use serde::{Deserialize, Serialize};

/// Price feed published by one delegate for one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeedIndex {
    /// asset the feed is about
    pub quote_id: AssetId,
    /// publishing delegate
    pub delegate_id: AccountId,
}

/// Last value of a price feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
    #[allow(missing_docs)]
    pub index: FeedIndex,
    /// published value, opaque to the ledger rules
    pub value: serde_json::Value,
    /// publication time
    pub last_update: BourseTime,
}
