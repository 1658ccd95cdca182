// Copyright (c) 2024 BOURSE LABS

//! Asset registry rules: creation, issuance and updates of asset records.
//!
//! Every rule reads the record, runs all of its checks on a local copy and
//! writes the whole record back only once they passed.

use crate::context::TransactionEvaluationState;
use bourse_evaluation_exports::EvaluationError;
use bourse_logging::bourse_trace;
use bourse_models::asset::{is_power_of_ten, is_valid_symbol, parent_symbol};
use bourse_models::config::constants::BASE_ASSET_ID;
use bourse_models::operation::{
    AssetUpdatePermissionsOperation, AssetUpdatePropertiesOperation,
    AssetUpdateWhitelistOperation, CreateAssetOperation, IssueAssetOperation, IssueSource,
    WhitelistAction,
};
use bourse_models::{
    AccountRecord, Asset, AssetFlag, AssetId, AssetIssuer, AssetRecord, MultisigCondition,
};
use bourse_state_exports::{ChainState, ChainStateExt};

fn supply_overflow(asset_id: AssetId) -> EvaluationError {
    EvaluationError::ArithmeticOverflow(format!("supply of asset {}", asset_id))
}

fn check_precision(
    context: &TransactionEvaluationState<'_>,
    precision: u64,
) -> Result<(), EvaluationError> {
    if !is_power_of_ten(precision) || precision > context.config().max_precision {
        return Err(EvaluationError::InvalidPrecision(precision));
    }
    Ok(())
}

/// Loads a user issued asset and checks the signers satisfy its authority
fn user_issued_asset(
    context: &TransactionEvaluationState<'_>,
    asset_id: AssetId,
) -> Result<AssetRecord, EvaluationError> {
    let record = context
        .state()
        .get_asset_by_id(asset_id)
        .ok_or(EvaluationError::UnknownAsset(asset_id))?;
    if !record.is_user_issued() {
        return Err(EvaluationError::NotUserIssued(asset_id));
    }
    context.verify_authority(&record.authority)?;
    Ok(record)
}

/// Account whose active key becomes the authority of an asset created by `issuer`
fn authority_account(
    context: &TransactionEvaluationState<'_>,
    issuer: &AssetIssuer,
) -> Result<AccountRecord, EvaluationError> {
    let state = context.state();
    match issuer {
        AssetIssuer::User(account_id) => state
            .get_account_by_id(*account_id)
            .ok_or(EvaluationError::UnknownAccount(*account_id)),
        AssetIssuer::Game(game_id) => {
            let game = state
                .get_game_by_id(*game_id)
                .ok_or(EvaluationError::UnknownGame(*game_id))?;
            state
                .get_account_by_id(game.owner_account_id)
                .ok_or(EvaluationError::UnknownAccount(game.owner_account_id))
        }
        AssetIssuer::Market | AssetIssuer::Genesis => Err(EvaluationError::InvalidIssuer),
    }
}

pub(crate) fn create_asset(
    context: &mut TransactionEvaluationState<'_>,
    op: &CreateAssetOperation,
) -> Result<(), EvaluationError> {
    if !is_valid_symbol(&op.symbol) {
        return Err(EvaluationError::InvalidSymbol(op.symbol.clone()));
    }
    if let Some(parent) = parent_symbol(&op.symbol) {
        let parent_record = context
            .state()
            .get_asset_by_symbol(parent)
            .ok_or_else(|| EvaluationError::UnknownAssetSymbol(parent.to_string()))?;
        if !parent_record.is_user_issued() {
            return Err(EvaluationError::NotUserIssued(parent_record.id));
        }
        context.verify_authority(&parent_record.authority)?;
    }
    if context.state().get_asset_by_symbol(&op.symbol).is_some() {
        return Err(EvaluationError::SymbolInUse(op.symbol.clone()));
    }
    if op.name.is_empty() {
        return Err(EvaluationError::EmptyName);
    }
    let next_id = context
        .state()
        .last_asset_id()?
        .checked_add(1)
        .ok_or_else(|| EvaluationError::ArithmeticOverflow("asset id space".to_string()))?;
    if context.state().get_asset_by_id(next_id).is_some() {
        return Err(EvaluationError::AssetIdInUse(next_id));
    }
    let account = authority_account(context, &op.issuer)?;
    if op.max_supply <= 0 || op.max_supply > context.config().max_shares {
        return Err(EvaluationError::InvalidMaxSupply(op.max_supply));
    }
    check_precision(context, op.precision)?;
    if op.initial_supply < 0 || op.initial_supply > op.max_supply {
        return Err(EvaluationError::InvalidAmount(op.initial_supply));
    }
    if op.initial_collateral < 0 {
        return Err(EvaluationError::InvalidAmount(op.initial_collateral));
    }

    let fee = context.config().registration_fee(&op.symbol);
    context.add_min_fee(Asset::new(fee, BASE_ASSET_ID))?;

    let id = context.state_mut().new_asset_id()?;
    let now = context.now();
    let record = AssetRecord {
        id,
        symbol: op.symbol.clone(),
        name: op.name.clone(),
        description: op.description.clone(),
        public_data: op.public_data.clone(),
        issuer: op.issuer,
        authority: MultisigCondition::single(account.active_key()),
        precision: op.precision,
        max_supply: op.max_supply,
        current_supply: op.initial_supply,
        current_collateral: op.initial_collateral,
        collected_fees: 0,
        withdrawal_fee: 0,
        market_fee_rate: 0,
        active_flags: Default::default(),
        authority_flag_permissions: Default::default(),
        whitelist: Default::default(),
        registration_date: now,
        last_update: now,
    };
    context.state_mut().store_asset(record);

    if let AssetIssuer::Game(game_id) = op.issuer {
        let mut game = context
            .state()
            .get_game_by_id(game_id)
            .ok_or(EvaluationError::UnknownGame(game_id))?;
        game.asset_id = Some(id);
        game.last_update = now;
        context.state_mut().store_game(game);
    }

    context.add_balance(Asset::new(op.initial_supply, id))?;
    context.sub_balance(Asset::new(op.initial_collateral, BASE_ASSET_ID))?;
    bourse_trace!("evaluation.asset.create", {
        "asset_id": id,
        "symbol": op.symbol,
        "registration_fee": fee
    });
    Ok(())
}

pub(crate) fn issue_asset(
    context: &mut TransactionEvaluationState<'_>,
    op: &IssueAssetOperation,
) -> Result<(), EvaluationError> {
    let mut record = user_issued_asset(context, op.asset_id)?;
    if op.amount <= 0 {
        return Err(EvaluationError::InvalidAmount(op.amount));
    }
    match op.source {
        IssueSource::Supply => {
            let available = record.available_shares();
            if op.amount > available {
                return Err(EvaluationError::OverIssue {
                    asset_id: op.asset_id,
                    amount: op.amount,
                    available,
                });
            }
            record.current_supply = record
                .current_supply
                .checked_add(op.amount)
                .ok_or_else(|| supply_overflow(op.asset_id))?;
        }
        IssueSource::CollectedFees => {
            if op.amount > record.collected_fees {
                return Err(EvaluationError::AmountTooLarge {
                    asset_id: op.asset_id,
                    amount: op.amount,
                    available: record.collected_fees,
                });
            }
            record.collected_fees -= op.amount;
        }
    }
    context.add_balance(Asset::new(op.amount, op.asset_id))?;
    record.last_update = context.now();
    context.state_mut().store_asset(record);
    Ok(())
}

pub(crate) fn update_properties(
    context: &mut TransactionEvaluationState<'_>,
    op: &AssetUpdatePropertiesOperation,
) -> Result<(), EvaluationError> {
    let mut record = user_issued_asset(context, op.asset_id)?;
    if op.is_noop() {
        return Err(EvaluationError::NoopUpdate);
    }
    let outstanding = record.current_supply != 0;
    let active_flags = record.active_flags;
    let locked = |flag: AssetFlag| outstanding && !active_flags.contains(flag);

    if let Some(account_id) = op.issuer_account_id {
        if context.state().get_account_by_id(account_id).is_none() {
            return Err(EvaluationError::UnknownAccount(account_id));
        }
        record.issuer = AssetIssuer::User(account_id);
    }
    if let Some(name) = &op.name {
        if name.is_empty() {
            return Err(EvaluationError::EmptyName);
        }
        record.name = name.clone();
    }
    if let Some(description) = &op.description {
        record.description = description.clone();
    }
    if let Some(public_data) = &op.public_data {
        record.public_data = public_data.clone();
    }
    if let Some(precision) = op.precision {
        // there is no dynamic precision flag
        if outstanding {
            return Err(EvaluationError::OutstandingSharesExist(op.asset_id));
        }
        check_precision(context, precision)?;
        record.precision = precision;
    }
    if let Some(max_supply) = op.max_supply {
        if locked(AssetFlag::DynamicMaxSupply) {
            return Err(EvaluationError::OutstandingSharesExist(op.asset_id));
        }
        if max_supply <= 0
            || max_supply < record.current_supply
            || max_supply > context.config().max_shares
        {
            return Err(EvaluationError::InvalidMaxSupply(max_supply));
        }
        record.max_supply = max_supply;
    }
    if let Some(withdrawal_fee) = op.withdrawal_fee {
        if locked(AssetFlag::DynamicFees) {
            return Err(EvaluationError::OutstandingSharesExist(op.asset_id));
        }
        if withdrawal_fee < 0 || withdrawal_fee > record.max_supply {
            return Err(EvaluationError::InvalidWithdrawalFee(withdrawal_fee));
        }
        record.withdrawal_fee = withdrawal_fee;
    }
    if let Some(market_fee_rate) = op.market_fee_rate {
        if locked(AssetFlag::DynamicFees) {
            return Err(EvaluationError::OutstandingSharesExist(op.asset_id));
        }
        if market_fee_rate > context.config().max_market_fee_rate {
            return Err(EvaluationError::InvalidMarketFeeRate(market_fee_rate));
        }
        record.market_fee_rate = market_fee_rate;
    }

    record.last_update = context.now();
    context.state_mut().store_asset(record);
    Ok(())
}

pub(crate) fn update_permissions(
    context: &mut TransactionEvaluationState<'_>,
    op: &AssetUpdatePermissionsOperation,
) -> Result<(), EvaluationError> {
    let mut record = user_issued_asset(context, op.asset_id)?;
    if op.is_noop() {
        return Err(EvaluationError::NoopUpdate);
    }

    if let Some(authority) = &op.authority {
        if !authority.is_valid() {
            return Err(EvaluationError::InvalidAuthority {
                required: authority.required,
                owners: authority.owners.len(),
            });
        }
        record.authority = authority.clone();
    }
    if let Some(permissions) = op.authority_flag_permissions {
        // once shares circulate, permissions can only be given up
        if record.current_supply != 0 {
            if let Some(flag) = permissions
                .iter()
                .find(|flag| !record.authority_has_flag_permission(*flag))
            {
                bourse_trace!("evaluation.asset.permission_escalation", {
                    "asset_id": op.asset_id,
                    "flag": format!("{:?}", flag)
                });
                return Err(EvaluationError::OutstandingSharesExist(op.asset_id));
            }
        }
        record.authority_flag_permissions = permissions;
    }
    if let Some(active_flags) = op.active_flags {
        if let Some(flag) = active_flags
            .iter()
            .find(|flag| !record.authority_has_flag_permission(*flag))
        {
            return Err(EvaluationError::PermissionNotAvailable {
                asset_id: op.asset_id,
                flag,
            });
        }
        record.active_flags = active_flags;
    }

    record.last_update = context.now();
    context.state_mut().store_asset(record);
    Ok(())
}

pub(crate) fn update_whitelist(
    context: &mut TransactionEvaluationState<'_>,
    op: &AssetUpdateWhitelistOperation,
) -> Result<(), EvaluationError> {
    let mut record = user_issued_asset(context, op.asset_id)?;
    match op.action {
        WhitelistAction::Add => {
            if !record.flag_is_active(AssetFlag::RestrictedDeposits) {
                return Err(EvaluationError::WhitelistDisabled(op.asset_id));
            }
            record.whitelist.insert(op.address);
        }
        WhitelistAction::Remove => {
            record.whitelist.remove(&op.address);
        }
    }
    record.last_update = context.now();
    context.state_mut().store_asset(record);
    Ok(())
}
