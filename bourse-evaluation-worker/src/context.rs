// Copyright (c) 2024 BOURSE LABS

//! Evaluation state of one transaction.
//!
//! Operations never move funds between records directly: they credit or debit the
//! transaction ledger held here, and the ledger has to settle once every operation
//! of the transaction has been evaluated.

use bourse_evaluation_exports::{EvaluationConfig, EvaluationError};
use bourse_models::{
    Address, Asset, AssetId, AssetRecord, MultisigCondition, ObjectId, ShareAmount,
};
use bourse_state_exports::{ChainState, ChainStateExt, StateChanges};
use bourse_state_worker::PendingState;
use bourse_time::BourseTime;
use std::collections::{BTreeMap, BTreeSet};

/// Copy of the evaluation state, restored when an operation fails
pub struct EvaluationSnapshot {
    /// state changes written so far
    changes: StateChanges,

    /// net transaction balance per asset
    balances: BTreeMap<AssetId, ShareAmount>,

    /// minimum fee per asset
    min_fees: BTreeMap<AssetId, ShareAmount>,
}

/// Context handed to every operation of a transaction, in sequence
pub struct TransactionEvaluationState<'a> {
    // transaction layer over the caller's state
    state: PendingState<'a>,

    config: &'a EvaluationConfig,

    /// addresses that signed the transaction
    signed_addresses: &'a BTreeSet<Address>,

    /// net transaction balance per asset: credits from withdrawals minus debits from deposits
    balances: BTreeMap<AssetId, ShareAmount>,

    /// fees the transaction must leave behind, per asset
    min_fees: BTreeMap<AssetId, ShareAmount>,
}

fn overflow(what: &str, asset_id: AssetId) -> EvaluationError {
    EvaluationError::ArithmeticOverflow(format!("{} of asset {}", what, asset_id))
}

impl<'a> TransactionEvaluationState<'a> {
    /// Opens a transaction layer over `parent`
    pub fn new(
        parent: &'a mut dyn ChainState,
        config: &'a EvaluationConfig,
        signed_addresses: &'a BTreeSet<Address>,
    ) -> Self {
        TransactionEvaluationState {
            state: PendingState::new(parent),
            config,
            signed_addresses,
            balances: BTreeMap::new(),
            min_fees: BTreeMap::new(),
        }
    }

    /// State seen by the transaction
    pub fn state(&self) -> &PendingState<'a> {
        &self.state
    }

    /// Mutable state seen by the transaction
    pub fn state_mut(&mut self) -> &mut PendingState<'a> {
        &mut self.state
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &EvaluationConfig {
        self.config
    }

    /// Current block time
    pub fn now(&self) -> BourseTime {
        self.state.now()
    }

    /// Whether `address` signed the transaction
    pub fn check_signature(&self, address: &Address) -> bool {
        self.signed_addresses.contains(address)
    }

    /// Fails with `MissingSignature` unless `address` signed the transaction
    pub fn require_signature(&self, address: &Address) -> Result<(), EvaluationError> {
        if !self.check_signature(address) {
            return Err(EvaluationError::MissingSignature(*address));
        }
        Ok(())
    }

    /// Fails unless the signers of the transaction satisfy `authority`
    pub fn verify_authority(&self, authority: &MultisigCondition) -> Result<(), EvaluationError> {
        if !authority.is_satisfied_by(self.signed_addresses) {
            return Err(EvaluationError::InsufficientAuthority);
        }
        Ok(())
    }

    /// Fails unless the signers of the transaction control object `id`.
    ///
    /// The owner chain of the object is followed for at most
    /// `owner_dependency_max_depth` hops.
    pub fn verify_object_authority(&self, id: ObjectId) -> Result<(), EvaluationError> {
        let condition = self
            .state
            .get_object_condition(id, self.config.owner_dependency_max_depth)?;
        self.verify_authority(&condition)
    }

    /// Record of the asset `amount` is denominated in
    pub fn validate_asset(&self, amount: &Asset) -> Result<AssetRecord, EvaluationError> {
        self.state
            .get_asset_by_id(amount.asset_id)
            .ok_or(EvaluationError::UnknownAsset(amount.asset_id))
    }

    /// Credits the transaction ledger
    pub fn add_balance(&mut self, amount: Asset) -> Result<(), EvaluationError> {
        if amount.amount == 0 {
            return Ok(());
        }
        let balance = self.balances.entry(amount.asset_id).or_default();
        *balance = balance
            .checked_add(amount.amount)
            .ok_or_else(|| overflow("transaction balance", amount.asset_id))?;
        Ok(())
    }

    /// Debits the transaction ledger. The balance may go negative until settlement.
    pub fn sub_balance(&mut self, amount: Asset) -> Result<(), EvaluationError> {
        if amount.amount == 0 {
            return Ok(());
        }
        let balance = self.balances.entry(amount.asset_id).or_default();
        *balance = balance
            .checked_sub(amount.amount)
            .ok_or_else(|| overflow("transaction balance", amount.asset_id))?;
        Ok(())
    }

    /// Raises the fee the transaction must leave behind
    pub fn add_min_fee(&mut self, amount: Asset) -> Result<(), EvaluationError> {
        if amount.amount == 0 {
            return Ok(());
        }
        let fee = self.min_fees.entry(amount.asset_id).or_default();
        *fee = fee
            .checked_add(amount.amount)
            .ok_or_else(|| overflow("minimum fee", amount.asset_id))?;
        Ok(())
    }

    /// Net transaction balance of `asset_id`
    pub fn balance(&self, asset_id: AssetId) -> ShareAmount {
        self.balances.get(&asset_id).copied().unwrap_or_default()
    }

    /// Minimum fee accumulated for `asset_id`
    pub fn min_fee(&self, asset_id: AssetId) -> ShareAmount {
        self.min_fees.get(&asset_id).copied().unwrap_or_default()
    }

    /// Checks that every asset nets to a non-negative amount covering its minimum fee.
    /// Returns the leftovers, which are the fees paid.
    pub fn settle(&self) -> Result<BTreeMap<AssetId, ShareAmount>, EvaluationError> {
        let asset_ids: BTreeSet<AssetId> = self
            .balances
            .keys()
            .chain(self.min_fees.keys())
            .copied()
            .collect();
        let mut fees_paid = BTreeMap::new();
        for asset_id in asset_ids {
            let balance = self.balance(asset_id);
            if balance < 0 {
                return Err(EvaluationError::NegativeBalance { asset_id, balance });
            }
            let required = self.min_fee(asset_id);
            if balance < required {
                return Err(EvaluationError::InsufficientFee {
                    asset_id,
                    paid: balance,
                    required,
                });
            }
            if balance > 0 {
                fees_paid.insert(asset_id, balance);
            }
        }
        Ok(fees_paid)
    }

    /// returns a copy of the evaluation state
    pub fn get_snapshot(&self) -> EvaluationSnapshot {
        EvaluationSnapshot {
            changes: self.state.get_snapshot(),
            balances: self.balances.clone(),
            min_fees: self.min_fees.clone(),
        }
    }

    /// resets the evaluation state to a snapshot
    pub fn reset_to_snapshot(&mut self, snapshot: EvaluationSnapshot) {
        self.state.reset_to_snapshot(snapshot.changes);
        self.balances = snapshot.balances;
        self.min_fees = snapshot.min_fees;
    }

    /// Applies the changes of the transaction to the parent state
    pub fn commit(self) {
        self.state.commit()
    }
}
