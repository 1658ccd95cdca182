// Copyright (c) 2024 BOURSE LABS

//! Moves between balance records and the transaction ledger

use crate::context::TransactionEvaluationState;
use bourse_evaluation_exports::EvaluationError;
use bourse_models::operation::{DepositOperation, WithdrawOperation};
use bourse_models::{Asset, AssetFlag, BalanceRecord};
use bourse_state_exports::ChainState;

pub(crate) fn withdraw(
    context: &mut TransactionEvaluationState<'_>,
    op: &WithdrawOperation,
) -> Result<(), EvaluationError> {
    if op.amount <= 0 {
        return Err(EvaluationError::InvalidAmount(op.amount));
    }
    let mut record = context
        .state()
        .get_balance(&op.balance_id)
        .ok_or(EvaluationError::UnknownBalance(op.balance_id))?;
    let asset = context.validate_asset(&record.get_balance())?;
    if asset.flag_is_active(AssetFlag::HaltedWithdrawals) {
        return Err(EvaluationError::WithdrawalsHalted(asset.id));
    }
    context.verify_authority(&record.condition.as_multisig())?;
    if op.amount > record.balance {
        return Err(EvaluationError::InsufficientFunds {
            asset_id: record.asset_id,
            needed: op.amount,
            available: record.balance,
        });
    }

    record.balance -= op.amount;
    record.last_update = context.now();
    let asset_id = record.asset_id;
    context.state_mut().store_balance(op.balance_id, record);
    context.add_balance(Asset::new(op.amount, asset_id))?;
    context.add_min_fee(Asset::new(asset.withdrawal_fee, asset_id))
}

pub(crate) fn deposit(
    context: &mut TransactionEvaluationState<'_>,
    op: &DepositOperation,
) -> Result<(), EvaluationError> {
    if op.amount <= 0 {
        return Err(EvaluationError::InvalidAmount(op.amount));
    }
    let amount = Asset::new(op.amount, op.asset_id);
    let asset = context.validate_asset(&amount)?;
    let owners = op.condition.as_multisig();
    if !owners.is_valid() {
        return Err(EvaluationError::InvalidAuthority {
            required: owners.required,
            owners: owners.owners.len(),
        });
    }
    if asset.flag_is_active(AssetFlag::RestrictedDeposits) {
        if let Some(address) = owners
            .owners
            .iter()
            .find(|owner| !asset.whitelist.contains(*owner))
        {
            return Err(EvaluationError::NotWhitelisted {
                asset_id: op.asset_id,
                address: *address,
            });
        }
    }

    let id = op.condition.balance_id(op.asset_id)?;
    let mut record = context
        .state()
        .get_balance(&id)
        .unwrap_or_else(|| BalanceRecord::new(op.condition.clone(), op.asset_id));
    record.balance = record.balance.checked_add(op.amount).ok_or_else(|| {
        EvaluationError::ArithmeticOverflow(format!("balance {}", id))
    })?;
    record.last_update = context.now();
    context.sub_balance(amount)?;
    context.state_mut().store_balance(id, record);
    Ok(())
}
