// Copyright (c) 2024 BOURSE LABS

use crate::{EvaluatorRegistry, TransactionEvaluator};
use bourse_evaluation_exports::{EvaluationConfig, Transaction};
use bourse_models::config::constants::BASE_ASSET_ID;
use bourse_models::operation::{DepositOperation, WithdrawOperation};
use bourse_models::{
    AccountId, Address, Asset, AssetId, OperationType, ShareAmount, WithdrawCondition,
};
use bourse_state_exports::ChainState;
use bourse_state_worker::test_exports::GenesisBuilder;
use bourse_time::BourseTime;
use std::collections::BTreeSet;
use std::sync::Arc;

/// chain time of every scenario genesis, in seconds
pub const NOW_SECS: u64 = 1_700_000_000;

/// core shares held by alice at genesis
pub const ALICE_CORE_BALANCE: ShareAmount = 10_000_000_000;

pub fn alice() -> Address {
    Address::from_public_key_bytes(b"alice")
}

pub fn bob() -> Address {
    Address::from_public_key_bytes(b"bob")
}

pub fn now() -> BourseTime {
    BourseTime::from_secs(NOW_SECS)
}

pub fn signature(owner: Address) -> WithdrawCondition {
    WithdrawCondition::Signature { owner }
}

/// Genesis with the account "alice" funded in core shares
pub fn genesis() -> (GenesisBuilder, AccountId) {
    let mut genesis = GenesisBuilder::new(now());
    let account = genesis.account("alice", alice(), alice());
    genesis.balance(
        signature(alice()),
        Asset::new(ALICE_CORE_BALANCE, BASE_ASSET_ID),
    );
    (genesis, account)
}

pub fn evaluator() -> TransactionEvaluator {
    TransactionEvaluator::new(
        EvaluationConfig::default(),
        Arc::new(EvaluatorRegistry::default()),
    )
}

/// Transaction expiring in one hour, signed by `signers`
pub fn transaction(operations: Vec<OperationType>, signers: &[Address]) -> Transaction {
    Transaction {
        expiration: BourseTime::from_secs(NOW_SECS + 3_600),
        operations,
        signers: signers.iter().copied().collect::<BTreeSet<_>>(),
    }
}

/// Moves `amount` out of the signature balance of `owner`
pub fn withdraw(owner: Address, amount: Asset) -> OperationType {
    OperationType::Withdraw(WithdrawOperation {
        balance_id: signature(owner).balance_id(amount.asset_id).unwrap(),
        amount: amount.amount,
    })
}

/// Moves `amount` into the signature balance of `owner`
pub fn deposit(owner: Address, amount: Asset) -> OperationType {
    OperationType::Deposit(DepositOperation {
        condition: signature(owner),
        amount: amount.amount,
        asset_id: amount.asset_id,
    })
}

/// Signature balance of `owner` in `asset_id`, zero when absent
pub fn balance_of(state: &dyn ChainState, owner: Address, asset_id: AssetId) -> ShareAmount {
    let id = signature(owner).balance_id(asset_id).unwrap();
    state.get_balance(&id).map_or(0, |record| record.balance)
}
