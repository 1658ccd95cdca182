// Copyright (c) 2024 BOURSE LABS

//! this file defines all possible evaluation error categories

use bourse_models::{
    AccountId, Address, AssetFlag, AssetId, BalanceId, GameId, MarketIndexKey, ModelsError,
    OrderKind, ShareAmount,
};
use bourse_serialization::SerializeError;
use bourse_state_exports::StateError;
use bourse_time::BourseTime;
use displaydoc::Display;
use thiserror::Error;

/// Broad class of an evaluation failure, for callers deciding how to report it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// the operation itself is ill-formed
    MalformedInput,
    /// the operation refers to a record that does not exist
    MissingReference,
    /// the required signatures are missing
    AuthorityFailure,
    /// applying the operation would break a ledger invariant
    InvariantViolation,
    /// the operation is reserved
    NotImplemented,
    /// the state or its encoding is inconsistent
    Internal,
}

/// Errors of the evaluation component.
#[non_exhaustive]
#[derive(Clone, Display, Error, Debug, PartialEq, Eq)]
pub enum EvaluationError {
    /// invalid amount: {0}
    InvalidAmount(ShareAmount),
    /// price can not be zero
    ZeroPrice,
    /// name can not be empty
    EmptyName,
    /// invalid symbol: {0}
    InvalidSymbol(String),
    /// precision {0} is not a power of ten up to 10^15
    InvalidPrecision(u64),
    /// max supply {0} is out of bounds
    InvalidMaxSupply(ShareAmount),
    /// withdrawal fee {0} is out of bounds
    InvalidWithdrawalFee(ShareAmount),
    /// market fee rate {0} exceeds the maximum
    InvalidMarketFeeRate(u16),
    /// assets can not be created with this issuer
    InvalidIssuer,
    /// the update does not change anything
    NoopUpdate,
    /// interest rate {0} is too high
    InterestRateTooHigh(u128),
    /// transaction holds {0} operations, more than allowed
    TooManyOperations(usize),
    /// transaction expiration {expiration} is too far after {now}
    ExpirationTooFar {
        /// requested expiration
        expiration: BourseTime,
        /// chain time
        now: BourseTime,
    },
    /// unknown asset: {0}
    UnknownAsset(AssetId),
    /// unknown asset symbol: {0}
    UnknownAssetSymbol(String),
    /// unknown account: {0}
    UnknownAccount(AccountId),
    /// unknown game: {0}
    UnknownGame(GameId),
    /// unknown {kind:?} order at {index:?}
    UnknownMarketOrder {
        /// book searched
        kind: OrderKind,
        /// key searched
        index: MarketIndexKey,
    },
    /// unknown margin position at {0:?}
    UnknownCollateral(MarketIndexKey),
    /// another margin position is already open at {0:?}
    CollateralIndexInUse(MarketIndexKey),
    /// unknown balance: {0}
    UnknownBalance(BalanceId),
    /// unknown operation type: {0}
    UnknownOperationType(u32),
    /// missing signature of {0}
    MissingSignature(Address),
    /// signatures do not satisfy the authority
    InsufficientAuthority,
    /// invalid authority: {required} required out of {owners} owners
    InvalidAuthority {
        /// threshold
        required: u32,
        /// number of owners
        owners: usize,
    },
    /// over-issue of asset {asset_id}: {amount} requested, {available} available
    OverIssue {
        #[allow(missing_docs)]
        asset_id: AssetId,
        #[allow(missing_docs)]
        amount: ShareAmount,
        #[allow(missing_docs)]
        available: ShareAmount,
    },
    /// amount {amount} of asset {asset_id} exceeds the {available} collected fees
    AmountTooLarge {
        #[allow(missing_docs)]
        asset_id: AssetId,
        #[allow(missing_docs)]
        amount: ShareAmount,
        #[allow(missing_docs)]
        available: ShareAmount,
    },
    /// insufficient funds of asset {asset_id}: {needed} needed, {available} available
    InsufficientFunds {
        #[allow(missing_docs)]
        asset_id: AssetId,
        #[allow(missing_docs)]
        needed: ShareAmount,
        #[allow(missing_docs)]
        available: ShareAmount,
    },
    /// asset {0} has outstanding shares, the attribute is locked
    OutstandingSharesExist(AssetId),
    /// symbol already in use: {0}
    SymbolInUse(String),
    /// asset id already in use: {0}
    AssetIdInUse(AssetId),
    /// the authority of asset {asset_id} lacks the permission {flag:?}
    PermissionNotAvailable {
        #[allow(missing_docs)]
        asset_id: AssetId,
        #[allow(missing_docs)]
        flag: AssetFlag,
    },
    /// asset {0} is not user issued
    NotUserIssued(AssetId),
    /// asset {0} is not market issued
    NotMarketIssued(AssetId),
    /// asset {0} is not the chip asset of a game
    NotChipAsset(AssetId),
    /// asset {0} does not restrict deposits
    WhitelistDisabled(AssetId),
    /// address {address} is not whitelisted for asset {asset_id}
    NotWhitelisted {
        #[allow(missing_docs)]
        asset_id: AssetId,
        #[allow(missing_docs)]
        address: Address,
    },
    /// asset {0} has no supply to price chips against
    ZeroSupply(AssetId),
    /// redeeming {amount} chips of asset {asset_id} exceeds its recorded totals
    ChipRedemptionExceedsTotals {
        #[allow(missing_docs)]
        asset_id: AssetId,
        #[allow(missing_docs)]
        amount: ShareAmount,
    },
    /// transaction balance of asset {asset_id} is negative: {balance}
    NegativeBalance {
        #[allow(missing_docs)]
        asset_id: AssetId,
        #[allow(missing_docs)]
        balance: ShareAmount,
    },
    /// fee paid in asset {asset_id} is {paid}, {required} required
    InsufficientFee {
        #[allow(missing_docs)]
        asset_id: AssetId,
        #[allow(missing_docs)]
        paid: ShareAmount,
        #[allow(missing_docs)]
        required: ShareAmount,
    },
    /// transaction expired at {expiration}, chain time is {now}
    TransactionExpired {
        /// transaction expiration
        expiration: BourseTime,
        /// chain time
        now: BourseTime,
    },
    /// withdrawals of asset {0} are halted
    WithdrawalsHalted(AssetId),
    /// invalid price: {0}
    InvalidPrice(String),
    /// arithmetic overflow: {0}
    ArithmeticOverflow(String),
    /// an evaluator is already registered for operation type {0}
    DuplicateOperationType(u32),
    /// not implemented: {0}
    NotImplemented(String),
    /// state error: {0}
    StateError(#[from] StateError),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
    /// serialization error: {0}
    SerializeError(#[from] SerializeError),
}

impl EvaluationError {
    /// Class of the failure
    pub fn category(&self) -> ErrorCategory {
        use EvaluationError::*;
        match self {
            InvalidAmount(_)
            | ZeroPrice
            | EmptyName
            | InvalidSymbol(_)
            | InvalidPrecision(_)
            | InvalidMaxSupply(_)
            | InvalidWithdrawalFee(_)
            | InvalidMarketFeeRate(_)
            | InvalidIssuer
            | NoopUpdate
            | InterestRateTooHigh(_)
            | TooManyOperations(_)
            | ExpirationTooFar { .. } => ErrorCategory::MalformedInput,
            UnknownAsset(_)
            | UnknownAssetSymbol(_)
            | UnknownAccount(_)
            | UnknownGame(_)
            | UnknownMarketOrder { .. }
            | UnknownCollateral(_)
            | UnknownBalance(_)
            | UnknownOperationType(_) => ErrorCategory::MissingReference,
            MissingSignature(_) | InsufficientAuthority | InvalidAuthority { .. } => {
                ErrorCategory::AuthorityFailure
            }
            OverIssue { .. }
            | AmountTooLarge { .. }
            | InsufficientFunds { .. }
            | OutstandingSharesExist(_)
            | SymbolInUse(_)
            | AssetIdInUse(_)
            | CollateralIndexInUse(_)
            | PermissionNotAvailable { .. }
            | NotUserIssued(_)
            | NotMarketIssued(_)
            | NotChipAsset(_)
            | WhitelistDisabled(_)
            | NotWhitelisted { .. }
            | ZeroSupply(_)
            | ChipRedemptionExceedsTotals { .. }
            | NegativeBalance { .. }
            | InsufficientFee { .. }
            | TransactionExpired { .. }
            | WithdrawalsHalted(_)
            | InvalidPrice(_)
            | ArithmeticOverflow(_) => ErrorCategory::InvariantViolation,
            NotImplemented(_) => ErrorCategory::NotImplemented,
            StateError(err) => match err {
                bourse_state_exports::StateError::UnknownObject(_)
                | bourse_state_exports::StateError::UnknownAccount(_)
                | bourse_state_exports::StateError::UnknownAsset(_)
                | bourse_state_exports::StateError::UnknownSymbol(_) => {
                    ErrorCategory::MissingReference
                }
                bourse_state_exports::StateError::NoOwnerCondition(_)
                | bourse_state_exports::StateError::CircularOwnership(_)
                | bourse_state_exports::StateError::OwnershipTooDeep(..)
                | bourse_state_exports::StateError::IdOverflow(_) => {
                    ErrorCategory::InvariantViolation
                }
                _ => ErrorCategory::Internal,
            },
            DuplicateOperationType(_) | ModelsError(_) | SerializeError(_) => {
                ErrorCategory::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            EvaluationError::ZeroPrice.category(),
            ErrorCategory::MalformedInput
        );
        assert_eq!(
            EvaluationError::UnknownAsset(4).category(),
            ErrorCategory::MissingReference
        );
        assert_eq!(
            EvaluationError::InsufficientAuthority.category(),
            ErrorCategory::AuthorityFailure
        );
        assert_eq!(
            EvaluationError::OutstandingSharesExist(1).category(),
            ErrorCategory::InvariantViolation
        );
        assert_eq!(
            EvaluationError::NotImplemented("remove_collateral".to_string()).category(),
            ErrorCategory::NotImplemented
        );
        assert_eq!(
            EvaluationError::from(StateError::CircularOwnership(3)).category(),
            ErrorCategory::InvariantViolation
        );
        assert_eq!(
            EvaluationError::from(StateError::UnknownObject(3)).category(),
            ErrorCategory::MissingReference
        );
    }

    #[test]
    fn test_messages_carry_context() {
        let err = EvaluationError::OverIssue {
            asset_id: 1,
            amount: 600_000,
            available: 500_000,
        };
        assert_eq!(
            err.to_string(),
            "over-issue of asset 1: 600000 requested, 500000 available"
        );
    }
}
