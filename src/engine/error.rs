//! Error types for ledger computation.

use thiserror::Error;

use crate::Amount;
use crate::model::ExpenseId;

/// A snapshot that breaks the engine's preconditions.
///
/// Returned by [`compute`](super::compute) before any expense is walked.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("participant '{0}' is listed more than once")]
    DuplicateParticipant(String),

    #[error("contribution recorded for unknown participant '{0}'")]
    UnknownContributor(String),

    #[error("contribution of '{0}' is negative: {1}")]
    NegativeContribution(String, Amount),

    #[error("pooled total is negative: {0}")]
    NegativePool(Amount),

    #[error("expense {0}: amount must be greater than 0, got {1}")]
    NonPositiveAmount(ExpenseId, Amount),

    #[error("duplicate expense id {0}")]
    DuplicateExpenseId(ExpenseId),

    #[error("expense {0}: payer '{1}' is not a participant")]
    UnknownPayer(ExpenseId, String),

    #[error("expense {0}: paid directly but no participant is named as payer")]
    MissingPayer(ExpenseId),
}
