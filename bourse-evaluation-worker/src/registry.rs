// Copyright (c) 2024 BOURSE LABS

//! Evaluators of custom operations, registered by type id before evaluation starts.
//!
//! The registry is built once and then only read, it can be shared between
//! evaluators behind an `Arc`.

use crate::context::TransactionEvaluationState;
use bourse_evaluation_exports::EvaluationError;
use std::collections::BTreeMap;

/// Rules of a custom operation type, typically a game
pub trait CustomEvaluator: Send + Sync {
    /// Applies the operation encoded in `payload`.
    /// Any error rejects the whole transaction.
    fn evaluate(
        &self,
        context: &mut TransactionEvaluationState<'_>,
        payload: &[u8],
    ) -> Result<(), EvaluationError>;
}

/// Immutable map from custom operation type id to its evaluator
#[derive(Default)]
pub struct EvaluatorRegistry {
    evaluators: BTreeMap<u32, Box<dyn CustomEvaluator>>,
}

impl EvaluatorRegistry {
    /// Starts an empty registry
    pub fn builder() -> EvaluatorRegistryBuilder {
        EvaluatorRegistryBuilder::default()
    }

    /// Evaluator registered for `type_id`
    pub fn get(&self, type_id: u32) -> Option<&dyn CustomEvaluator> {
        self.evaluators.get(&type_id).map(|evaluator| evaluator.as_ref())
    }

    /// Registered type ids, in increasing order
    pub fn type_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.evaluators.keys().copied()
    }
}

/// Collects evaluators before freezing them in an `EvaluatorRegistry`
#[derive(Default)]
pub struct EvaluatorRegistryBuilder {
    evaluators: BTreeMap<u32, Box<dyn CustomEvaluator>>,
}

impl EvaluatorRegistryBuilder {
    /// Registers `evaluator` for `type_id`, which must not be taken yet
    pub fn register<E: CustomEvaluator + 'static>(
        mut self,
        type_id: u32,
        evaluator: E,
    ) -> Result<Self, EvaluationError> {
        if self.evaluators.contains_key(&type_id) {
            return Err(EvaluationError::DuplicateOperationType(type_id));
        }
        self.evaluators.insert(type_id, Box::new(evaluator));
        Ok(self)
    }

    #[allow(missing_docs)]
    pub fn build(self) -> EvaluatorRegistry {
        EvaluatorRegistry {
            evaluators: self.evaluators,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    struct Noop;

    impl CustomEvaluator for Noop {
        fn evaluate(
            &self,
            _context: &mut TransactionEvaluationState<'_>,
            _payload: &[u8],
        ) -> Result<(), EvaluationError> {
            Ok(())
        }
    }

    #[test]
    fn test_duplicate_type_id_is_rejected() {
        let builder = EvaluatorRegistry::builder().register(3, Noop).unwrap();
        assert_matches!(
            builder.register(3, Noop).err(),
            Some(EvaluationError::DuplicateOperationType(3))
        );
    }

    #[test]
    fn test_lookup() {
        let registry = EvaluatorRegistry::builder()
            .register(9, Noop)
            .unwrap()
            .register(2, Noop)
            .unwrap()
            .build();
        assert!(registry.get(2).is_some());
        assert!(registry.get(5).is_none());
        assert_eq!(registry.type_ids().collect::<Vec<_>>(), vec![2, 9]);
    }
}
