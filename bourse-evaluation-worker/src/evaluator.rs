// Copyright (c) 2024 BOURSE LABS

//! Transaction evaluation entry point.
//!
//! A transaction is evaluated against a `TransactionEvaluationState` layered over
//! the caller's state. Operations run in order, the first failure rejects the
//! transaction and nothing reaches the caller's state.

use crate::context::TransactionEvaluationState;
use crate::registry::EvaluatorRegistry;
use crate::{asset_operations, balance_operations, market_operations};
use bourse_evaluation_exports::{
    EvaluationConfig, EvaluationError, Transaction, TransactionOutput,
};
use bourse_logging::bourse_trace;
use bourse_models::OperationType;
use bourse_state_exports::ChainState;
use bourse_time::BourseTime;
use std::sync::Arc;
use tracing::debug;

/// Applies transactions to a chain state
pub struct TransactionEvaluator {
    config: EvaluationConfig,
    registry: Arc<EvaluatorRegistry>,
}

impl TransactionEvaluator {
    /// Creates an evaluator using `registry` for custom operations
    pub fn new(config: EvaluationConfig, registry: Arc<EvaluatorRegistry>) -> Self {
        TransactionEvaluator { config, registry }
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluates `tx` on top of `state`.
    ///
    /// On success the changes of the transaction are written to `state` and the
    /// fees it left behind are returned. On failure `state` is untouched.
    pub fn evaluate(
        &self,
        state: &mut dyn ChainState,
        tx: &Transaction,
    ) -> Result<TransactionOutput, EvaluationError> {
        self.check_envelope(state.now(), tx)?;

        let mut context = TransactionEvaluationState::new(state, &self.config, &tx.signers);
        for (index, op) in tx.operations.iter().enumerate() {
            let snapshot = context.get_snapshot();
            if let Err(err) = self.evaluate_operation(&mut context, op) {
                debug!(
                    "operation {} ({}) of transaction failed: {}",
                    index,
                    op.name(),
                    err
                );
                context.reset_to_snapshot(snapshot);
                return Err(err);
            }
        }

        let fees_paid = match context.settle() {
            Ok(fees_paid) => fees_paid,
            Err(err) => {
                debug!("transaction settlement failed: {}", err);
                return Err(err);
            }
        };
        context.commit();
        bourse_trace!("evaluation.transaction.applied", {
            "operation_count": tx.operations.len(),
            "fees_paid": fees_paid
        });
        Ok(TransactionOutput {
            fees_paid,
            operation_count: tx.operations.len(),
        })
    }

    fn check_envelope(
        &self,
        now: BourseTime,
        tx: &Transaction,
    ) -> Result<(), EvaluationError> {
        let max_operations = self.config.max_operations_per_transaction as usize;
        if tx.operations.len() > max_operations {
            return Err(EvaluationError::TooManyOperations(tx.operations.len()));
        }
        if now > tx.expiration {
            return Err(EvaluationError::TransactionExpired {
                expiration: tx.expiration,
                now,
            });
        }
        if tx.expiration > now.saturating_add(self.config.max_transaction_expiration) {
            return Err(EvaluationError::ExpirationTooFar {
                expiration: tx.expiration,
                now,
            });
        }
        Ok(())
    }

    /// Applies a single operation to `context`
    pub fn evaluate_operation(
        &self,
        context: &mut TransactionEvaluationState<'_>,
        op: &OperationType,
    ) -> Result<(), EvaluationError> {
        match op {
            OperationType::CreateAsset(op) => asset_operations::create_asset(context, op),
            OperationType::IssueAsset(op) => asset_operations::issue_asset(context, op),
            OperationType::AssetUpdateProperties(op) => {
                asset_operations::update_properties(context, op)
            }
            OperationType::AssetUpdatePermissions(op) => {
                asset_operations::update_permissions(context, op)
            }
            OperationType::AssetUpdateWhitelist(op) => {
                asset_operations::update_whitelist(context, op)
            }
            OperationType::Bid(op) => market_operations::bid(context, op),
            OperationType::Ask(op) => market_operations::ask(context, op),
            OperationType::Short(op) => market_operations::short(context, op),
            OperationType::Cover(op) => market_operations::cover(context, op),
            OperationType::AddCollateral(op) => market_operations::add_collateral(context, op),
            OperationType::RemoveCollateral(op) => {
                market_operations::remove_collateral(context, op)
            }
            OperationType::BuyChips(op) => market_operations::buy_chips(context, op),
            OperationType::SellChips(op) => market_operations::sell_chips(context, op),
            OperationType::Withdraw(op) => balance_operations::withdraw(context, op),
            OperationType::Deposit(op) => balance_operations::deposit(context, op),
            OperationType::Custom { type_id, payload } => self
                .registry
                .get(*type_id)
                .ok_or(EvaluationError::UnknownOperationType(*type_id))?
                .evaluate(context, payload),
        }
    }
}
