// Copyright (c) 2024 BOURSE LABS

use crate::account::AccountId;
use crate::asset::AssetId;
use crate::authority::MultisigCondition;
use serde::{Deserialize, Serialize};

/// Object identifier
pub type ObjectId = u64;

/// What an object is, and where its ownership comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Generic object. It is owned by `owners` when `owner_object` is itself,
    /// otherwise by whoever owns `owner_object`.
    Base {
        /// object whose owners own this one
        owner_object: ObjectId,
        /// direct owners, used when the object owns itself
        owners: MultisigCondition,
    },
    /// Named link between two objects, owned by the owner of `from`
    Edge {
        #[allow(missing_docs)]
        from: ObjectId,
        #[allow(missing_docs)]
        to: ObjectId,
        #[allow(missing_docs)]
        name: String,
    },
    /// Mirror of an account, owned by the account owner key
    Account(AccountId),
    /// Mirror of an asset, owned by the owner key of its issuing account
    Asset(AssetId),
}

/// Generic on-chain object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    #[allow(missing_docs)]
    pub id: ObjectId,
    #[allow(missing_docs)]
    pub kind: ObjectKind,
    /// opaque data
    pub public_data: serde_json::Value,
}
