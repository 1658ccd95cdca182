// Copyright (c) 2024 BOURSE LABS

use crate::account::AccountId;
use crate::asset::AssetId;
use bourse_time::BourseTime;
use serde::{Deserialize, Serialize};

/// Game identifier
pub type GameId = u32;

/// Third-party game registered on chain, issuer of chip assets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// identifier
    pub id: GameId,
    /// unique name
    pub name: String,
    /// free text
    pub description: String,
    /// account answering for the game, its active key signs for the chips
    pub owner_account_id: AccountId,
    /// chip asset of the game, once created
    pub asset_id: Option<AssetId>,
    /// creation time
    pub registration_date: BourseTime,
    /// time of the last mutation
    pub last_update: BourseTime,
}
