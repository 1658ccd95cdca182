// Copyright (c) 2024 BOURSE LABS

//! Market rules: resting orders, margin positions and chip exchange.
//!
//! Order records are created on first deposit and deleted by storing a zero balance.
//! Margin positions are indexed by their call price, so any change of their balances
//! deletes the record under the old key and stores it again under the new one.

use crate::context::TransactionEvaluationState;
use bourse_evaluation_exports::EvaluationError;
use bourse_logging::bourse_trace;
use bourse_models::config::constants::{BASE_ASSET_ID, SECONDS_PER_YEAR};
use bourse_models::operation::{ChipsOperation, CoverOperation, OrderOperation, ShortOperation};
use bourse_models::{
    Address, Asset, AssetId, AssetRecord, BalanceRecord, CollateralRecord, MarketIndexKey,
    OrderKind, Price, ShareAmount, WithdrawCondition,
};
use bourse_state_exports::{ChainState, ChainStateExt};

fn overflow(what: &str) -> EvaluationError {
    EvaluationError::ArithmeticOverflow(what.to_string())
}

/// Asset an order of `kind` holds: bids hold quote, asks and shorts hold base
fn order_side_asset(kind: OrderKind, index: &MarketIndexKey) -> AssetId {
    match kind {
        OrderKind::Bid => index.order_price.quote_asset_id,
        OrderKind::Ask | OrderKind::Short => index.order_price.base_asset_id,
    }
}

fn mark_dirty(
    context: &mut TransactionEvaluationState<'_>,
    index: &MarketIndexKey,
) -> Result<(), EvaluationError> {
    let price = &index.order_price;
    context
        .state_mut()
        .mark_market_dirty(price.quote_asset_id, price.base_asset_id)?;
    Ok(())
}

/// Deposits into or withdraws from the order of `kind` at `op.index`.
/// `short_price_limit` is only given for shorts and replaces the stored limit.
fn update_order(
    context: &mut TransactionEvaluationState<'_>,
    kind: OrderKind,
    op: &OrderOperation,
    short_price_limit: Option<Option<Price>>,
) -> Result<(), EvaluationError> {
    if op.index.order_price.is_zero() {
        return Err(EvaluationError::ZeroPrice);
    }
    context.require_signature(&op.index.owner)?;
    let asset_id = order_side_asset(kind, &op.index);
    context.validate_asset(&Asset::new(op.amount, asset_id))?;
    if op.amount == 0 {
        return Err(EvaluationError::InvalidAmount(op.amount));
    }

    let current = context.state().get_order(kind, &op.index);
    let mut order = if op.amount < 0 {
        let order = current.ok_or(EvaluationError::UnknownMarketOrder {
            kind,
            index: op.index,
        })?;
        let withdrawn = op
            .amount
            .checked_neg()
            .ok_or_else(|| overflow("order withdrawal"))?;
        if withdrawn > order.balance {
            return Err(EvaluationError::InsufficientFunds {
                asset_id,
                needed: withdrawn,
                available: order.balance,
            });
        }
        context.add_balance(Asset::new(withdrawn, asset_id))?;
        order
    } else {
        context.sub_balance(Asset::new(op.amount, asset_id))?;
        current.unwrap_or_default()
    };

    order.balance = order
        .balance
        .checked_add(op.amount)
        .ok_or_else(|| overflow("order balance"))?;
    order.last_update = context.now();
    if let Some(limit) = short_price_limit {
        order.limit_price = limit;
    }
    bourse_trace!("evaluation.market.order", {
        "kind": format!("{:?}", kind),
        "price": op.index.order_price.to_string(),
        "owner": op.index.owner.to_string(),
        "balance": order.balance
    });
    context.state_mut().store_order(kind, op.index, order);
    mark_dirty(context, &op.index)
}

pub(crate) fn bid(
    context: &mut TransactionEvaluationState<'_>,
    op: &OrderOperation,
) -> Result<(), EvaluationError> {
    update_order(context, OrderKind::Bid, op, None)
}

pub(crate) fn ask(
    context: &mut TransactionEvaluationState<'_>,
    op: &OrderOperation,
) -> Result<(), EvaluationError> {
    update_order(context, OrderKind::Ask, op, None)
}

pub(crate) fn short(
    context: &mut TransactionEvaluationState<'_>,
    op: &ShortOperation,
) -> Result<(), EvaluationError> {
    let rate = op.index.order_price.ratio;
    if rate >= context.config().max_short_interest_ratio() {
        return Err(EvaluationError::InterestRateTooHigh(rate));
    }
    let quote_id = op.index.order_price.quote_asset_id;
    let quote = context
        .state()
        .get_asset_by_id(quote_id)
        .ok_or(EvaluationError::UnknownAsset(quote_id))?;
    if !quote.is_market_issued() {
        return Err(EvaluationError::NotMarketIssued(quote_id));
    }
    let order = OrderOperation {
        amount: op.amount,
        index: op.index,
    };
    update_order(context, OrderKind::Short, &order, Some(op.short_price_limit))
}

/// Interest owed on a payment of `amount`, accrued linearly over `elapsed_secs`
/// out of a 365 days year and never above `amount`
pub(crate) fn interest_due(
    amount: ShareAmount,
    rate: &Price,
    elapsed_secs: u64,
) -> Result<ShareAmount, EvaluationError> {
    let yearly = rate.mul_floor(amount)?;
    let due = i128::from(yearly)
        .checked_mul(i128::from(elapsed_secs))
        .ok_or_else(|| overflow("interest"))?
        / i128::from(SECONDS_PER_YEAR);
    Ok(ShareAmount::try_from(due).map_or(amount, |due| due.min(amount)))
}

fn call_price(
    position: &CollateralRecord,
    quote_id: AssetId,
    base_id: AssetId,
) -> Result<Price, EvaluationError> {
    position
        .call_price(quote_id, base_id)
        .map_err(|err| EvaluationError::InvalidPrice(err.to_string()))
}

/// Re-indexes a position from `from` to `to`.
/// `to` must not hold another position of the same owner.
fn move_position(
    context: &mut TransactionEvaluationState<'_>,
    from: &MarketIndexKey,
    to: MarketIndexKey,
    position: CollateralRecord,
) -> Result<(), EvaluationError> {
    if to != *from && context.state().get_collateral(&to).is_some() {
        return Err(EvaluationError::CollateralIndexInUse(to));
    }
    context
        .state_mut()
        .store_collateral(*from, CollateralRecord::default());
    context.state_mut().store_collateral(to, position);
    Ok(())
}

pub(crate) fn cover(
    context: &mut TransactionEvaluationState<'_>,
    op: &CoverOperation,
) -> Result<(), EvaluationError> {
    if op.index.order_price.is_zero() {
        return Err(EvaluationError::ZeroPrice);
    }
    if op.amount < 0 || (op.amount == 0 && op.new_cover_price.is_none()) {
        return Err(EvaluationError::InvalidAmount(op.amount));
    }
    context.require_signature(&op.index.owner)?;

    let quote_id = op.index.order_price.quote_asset_id;
    let base_id = op.index.order_price.base_asset_id;
    let mut position = context
        .state()
        .get_collateral(&op.index)
        .ok_or(EvaluationError::UnknownCollateral(op.index))?;
    let mut quote = context
        .state()
        .get_asset_by_id(quote_id)
        .ok_or(EvaluationError::UnknownAsset(quote_id))?;
    if op.amount > position.payoff_balance {
        return Err(EvaluationError::InsufficientFunds {
            asset_id: quote_id,
            needed: op.amount,
            available: position.payoff_balance,
        });
    }
    context.sub_balance(Asset::new(op.amount, quote_id))?;

    let now = context.now();
    let start = position
        .expiration
        .saturating_sub(context.config().max_short_period);
    let elapsed_secs = now.saturating_sub(start).to_secs();
    let due = interest_due(op.amount, &position.interest_rate, elapsed_secs)?;
    let principal = op.amount - due;

    quote.current_supply = quote
        .current_supply
        .checked_sub(principal)
        .ok_or_else(|| overflow("covered supply"))?;
    quote.collected_fees = quote
        .collected_fees
        .checked_add(due)
        .ok_or_else(|| overflow("collected fees"))?;
    quote.last_update = now;

    position.payoff_balance -= op.amount;
    let new_index = if position.payoff_balance > 0 {
        let computed = call_price(&position, quote_id, base_id)?;
        let price = match op.new_cover_price {
            Some(requested) if requested.same_market(&computed) && requested > computed => {
                requested
            }
            _ => computed,
        };
        Some(MarketIndexKey::new(price, op.index.owner))
    } else {
        None
    };

    context.state_mut().store_asset(quote);
    match new_index {
        Some(index) => move_position(context, &op.index, index, position)?,
        None => {
            context
                .state_mut()
                .store_collateral(op.index, CollateralRecord::default());
            context.add_balance(Asset::new(position.collateral_balance, base_id))?;
        }
    }
    bourse_trace!("evaluation.market.cover", {
        "owner": op.index.owner.to_string(),
        "paid": op.amount,
        "interest": due
    });
    mark_dirty(context, &op.index)
}

pub(crate) fn add_collateral(
    context: &mut TransactionEvaluationState<'_>,
    op: &OrderOperation,
) -> Result<(), EvaluationError> {
    if op.index.order_price.is_zero() {
        return Err(EvaluationError::ZeroPrice);
    }
    if op.amount <= 0 {
        return Err(EvaluationError::InvalidAmount(op.amount));
    }
    let quote_id = op.index.order_price.quote_asset_id;
    let base_id = op.index.order_price.base_asset_id;
    let mut position = context
        .state()
        .get_collateral(&op.index)
        .ok_or(EvaluationError::UnknownCollateral(op.index))?;
    context.sub_balance(Asset::new(op.amount, base_id))?;

    position.collateral_balance = position
        .collateral_balance
        .checked_add(op.amount)
        .ok_or_else(|| overflow("collateral balance"))?;
    let index = MarketIndexKey::new(call_price(&position, quote_id, base_id)?, op.index.owner);

    move_position(context, &op.index, index, position)?;
    mark_dirty(context, &op.index)
}

pub(crate) fn remove_collateral(
    _context: &mut TransactionEvaluationState<'_>,
    _op: &OrderOperation,
) -> Result<(), EvaluationError> {
    Err(EvaluationError::NotImplemented(
        "remove_collateral".to_string(),
    ))
}

/// Loads a chip asset, which must have chips in circulation to be priced
fn chip_asset(
    context: &TransactionEvaluationState<'_>,
    amount: &Asset,
) -> Result<AssetRecord, EvaluationError> {
    if amount.amount <= 0 {
        return Err(EvaluationError::InvalidAmount(amount.amount));
    }
    let record = context.validate_asset(amount)?;
    if !record.is_chip_asset() {
        return Err(EvaluationError::NotChipAsset(amount.asset_id));
    }
    if record.current_supply <= 0 {
        return Err(EvaluationError::ZeroSupply(amount.asset_id));
    }
    Ok(record)
}

/// Core asset value of `chips`: `floor(chips × current_collateral / current_supply)`
pub(crate) fn chip_value(
    record: &AssetRecord,
    chips: ShareAmount,
) -> Result<ShareAmount, EvaluationError> {
    if record.current_supply <= 0 {
        return Err(EvaluationError::ZeroSupply(record.id));
    }
    let value = i128::from(chips)
        .checked_mul(i128::from(record.current_collateral))
        .ok_or_else(|| overflow("chip value"))?
        / i128::from(record.current_supply);
    ShareAmount::try_from(value).map_err(|_| overflow("chip value"))
}

/// Credits the balance of `owner` in `asset_id`, creating the record if needed
fn credit_owner_balance(
    context: &mut TransactionEvaluationState<'_>,
    owner: &Address,
    amount: Asset,
) -> Result<(), EvaluationError> {
    let condition = WithdrawCondition::Signature { owner: *owner };
    let id = condition.balance_id(amount.asset_id)?;
    let mut record = context
        .state()
        .get_balance(&id)
        .unwrap_or_else(|| BalanceRecord::new(condition, amount.asset_id));
    record.balance = record
        .balance
        .checked_add(amount.amount)
        .ok_or_else(|| overflow("balance"))?;
    record.last_update = context.now();
    context.state_mut().store_balance(id, record);
    Ok(())
}

pub(crate) fn buy_chips(
    context: &mut TransactionEvaluationState<'_>,
    op: &ChipsOperation,
) -> Result<(), EvaluationError> {
    let mut record = chip_asset(context, &op.amount)?;
    let cost = chip_value(&record, op.amount.amount)?;
    let supply = record
        .current_supply
        .checked_add(op.amount.amount)
        .ok_or_else(|| overflow("chip supply"))?;
    if supply > record.max_supply {
        return Err(EvaluationError::OverIssue {
            asset_id: record.id,
            amount: op.amount.amount,
            available: record.available_shares(),
        });
    }
    record.current_supply = supply;
    record.current_collateral = record
        .current_collateral
        .checked_add(cost)
        .ok_or_else(|| overflow("chip collateral"))?;
    record.last_update = context.now();

    context.sub_balance(Asset::new(cost, BASE_ASSET_ID))?;
    credit_owner_balance(context, &op.owner, op.amount)?;
    context.state_mut().store_asset(record);
    Ok(())
}

pub(crate) fn sell_chips(
    context: &mut TransactionEvaluationState<'_>,
    op: &ChipsOperation,
) -> Result<(), EvaluationError> {
    let mut record = chip_asset(context, &op.amount)?;
    let proceeds = chip_value(&record, op.amount.amount)?;
    if op.amount.amount > record.current_supply || proceeds > record.current_collateral {
        return Err(EvaluationError::ChipRedemptionExceedsTotals {
            asset_id: record.id,
            amount: op.amount.amount,
        });
    }
    record.current_supply -= op.amount.amount;
    record.current_collateral -= proceeds;
    record.last_update = context.now();

    context.sub_balance(op.amount)?;
    credit_owner_balance(context, &op.owner, Asset::new(proceeds, BASE_ASSET_ID))?;
    context.state_mut().store_asset(record);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use bourse_models::config::constants::PRICE_ONE;
    use bourse_models::{AssetIssuer, MultisigCondition};

    fn chips(supply: ShareAmount, collateral: ShareAmount) -> AssetRecord {
        AssetRecord {
            id: 4,
            symbol: "CHIPS".to_string(),
            name: "chips".to_string(),
            description: String::new(),
            public_data: serde_json::Value::Null,
            issuer: AssetIssuer::Game(1),
            authority: MultisigCondition::default(),
            precision: 1,
            max_supply: ShareAmount::MAX,
            current_supply: supply,
            current_collateral: collateral,
            collected_fees: 0,
            withdrawal_fee: 0,
            market_fee_rate: 0,
            active_flags: Default::default(),
            authority_flag_permissions: Default::default(),
            whitelist: Default::default(),
            registration_date: Default::default(),
            last_update: Default::default(),
        }
    }

    #[test]
    fn test_interest_is_prorated_and_floored() {
        // 10% a year
        let rate = Price::new(PRICE_ONE / 10, 1, 0);
        assert_eq!(interest_due(1_000_000, &rate, 0).unwrap(), 0);
        assert_eq!(
            interest_due(1_000_000, &rate, SECONDS_PER_YEAR).unwrap(),
            99_999
        );
        assert_eq!(
            interest_due(1_000_000, &rate, SECONDS_PER_YEAR / 2).unwrap(),
            49_999
        );
    }

    #[test]
    fn test_interest_never_exceeds_payment() {
        let rate = Price::new(9 * PRICE_ONE, 1, 0);
        assert_eq!(interest_due(100, &rate, 10 * SECONDS_PER_YEAR).unwrap(), 100);
    }

    #[test]
    fn test_chip_value_rounds_down() {
        let record = chips(3, 10);
        assert_eq!(chip_value(&record, 1).unwrap(), 3);
        assert_eq!(chip_value(&record, 2).unwrap(), 6);
        assert_eq!(chip_value(&record, 3).unwrap(), 10);
        assert_eq!(chip_value(&chips(3, 2), 1).unwrap(), 0);
    }

    #[test]
    fn test_chip_round_trip_never_pays_out_more() {
        for (supply, collateral) in [(3, 10), (3, 2), (7, 1_000), (1_000, 1), (9, 9)] {
            for bought in [1, 2, 5, 13, 1_000] {
                let mut record = chips(supply, collateral);
                let cost = chip_value(&record, bought).unwrap();
                record.current_supply += bought;
                record.current_collateral += cost;
                let proceeds = chip_value(&record, bought).unwrap();
                assert!(
                    proceeds <= cost,
                    "{} chips of {}/{} cost {} and redeem {}",
                    bought,
                    collateral,
                    supply,
                    cost,
                    proceeds
                );
                // the remaining holders are never diluted
                let (rest, backing) = (
                    record.current_supply - bought,
                    record.current_collateral - proceeds,
                );
                assert!(i128::from(backing) * i128::from(supply)
                    >= i128::from(collateral) * i128::from(rest));
            }
        }
    }

    #[test]
    fn test_chip_value_overflow() {
        assert_matches!(
            chip_value(&chips(1, ShareAmount::MAX), ShareAmount::MAX),
            Err(EvaluationError::ArithmeticOverflow(_))
        );
        assert_matches!(
            chip_value(&chips(0, 10), 1),
            Err(EvaluationError::ZeroSupply(4))
        );
    }
}
