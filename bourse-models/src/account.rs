// Copyright (c) 2024 BOURSE LABS

use crate::address::Address;
use crate::config::constants::{MAX_NAME_SIZE, MIN_NAME_SIZE};
use bourse_time::BourseTime;
use serde::{Deserialize, Serialize};

/// Account identifier
pub type AccountId = u32;

/// Registered account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// identifier
    pub id: AccountId,
    /// unique, possibly hierarchical, name
    pub name: String,
    /// opaque data attached by the owner
    pub public_data: serde_json::Value,
    /// long-term key, controls the account itself
    pub owner_address: Address,
    /// day-to-day key, used as the authority of the assets the account creates
    pub active_address: Address,
    /// creation time
    pub registration_date: BourseTime,
    /// time of the last mutation
    pub last_update: BourseTime,
}

impl AccountRecord {
    /// Key used to sign on behalf of the account
    pub fn active_key(&self) -> Address {
        self.active_address
    }
}

/// `parent` for `sub.parent`, `None` for a top level name
pub fn parent_account_name(name: &str) -> Option<&str> {
    name.split_once('.').map(|(_, parent)| parent)
}

fn is_lower_alnum(c: u8) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

/// Account naming rules.
///
/// 1 to 63 characters starting with a letter. Every dot-separated label is made of
/// lowercase letters, digits and hyphens, and ends with a lowercase letter or a digit.
///
/// ```
/// # use bourse_models::account::is_valid_account_name;
/// assert!(is_valid_account_name("alice"));
/// assert!(is_valid_account_name("pay-roll.acme"));
/// assert!(!is_valid_account_name("alice-"));
/// assert!(!is_valid_account_name("Alice"));
/// ```
pub fn is_valid_account_name(name: &str) -> bool {
    if name.len() < MIN_NAME_SIZE || name.len() > MAX_NAME_SIZE || !name.is_ascii() {
        return false;
    }
    let mut remaining = Some(name);
    while let Some(current) = remaining {
        let (label, parent) = match current.split_once('.') {
            Some((label, parent)) => (label, Some(parent)),
            None => (current, None),
        };
        let first = match label.bytes().next() {
            Some(first) => first,
            None => return false,
        };
        let last = label.as_bytes()[label.len() - 1];
        if !first.is_ascii_alphabetic() || !is_lower_alnum(last) {
            return false;
        }
        if !label.bytes().all(|c| is_lower_alnum(c) || c == b'-') {
            return false;
        }
        remaining = parent;
    }
    true
}
