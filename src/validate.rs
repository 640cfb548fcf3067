//! Checks run on user input before it reaches the trip store.
//!
//! The engine assumes a well-formed trip; these are the rejections a user sees
//! when setting up a trip or logging an expense.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::Amount;
use crate::model::{Expense, ExpenseId, PaidBy, Trip};

pub const MIN_PARTICIPANTS: usize = 2;
pub const MAX_PARTICIPANTS: usize = 20;

/// A rejected mutation, worded for the user.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("you need at least {min} participants for a trip, got {0}", min = MIN_PARTICIPANTS)]
    TooFewParticipants(usize),

    #[error("maximum {max} participants allowed, got {0}", max = MAX_PARTICIPANTS)]
    TooManyParticipants(usize),

    #[error("participant names must be unique: '{0}' appears twice")]
    DuplicateParticipant(String),

    #[error("contribution of '{0}' cannot be negative")]
    NegativeContribution(String),

    #[error("total pooled amount must be greater than 0")]
    EmptyFund,

    #[error("expense title is required")]
    EmptyTitle,

    #[error("amount must be greater than 0, got {0}")]
    NonPositiveAmount(Amount),

    #[error("please select who paid for this expense")]
    MissingPayer,

    #[error("pool fund has only {available}, please select who will pay the remaining {remaining}")]
    FundShortfall { available: Amount, remaining: Amount },

    #[error("pool fund would no longer cover expense {expense}, leaving {remaining} with no payer")]
    LaterShortfall { expense: ExpenseId, remaining: Amount },

    #[error("'{0}' is not a participant of this trip")]
    UnknownParticipant(String),
}

/// Clean up a participant list: trim names, drop blank rows, and enforce the
/// trip size and case-insensitive uniqueness.
pub fn participants<I, S>(names: I) -> Result<Vec<String>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: Vec<String> = names
        .into_iter()
        .map(|name| name.as_ref().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    if names.len() < MIN_PARTICIPANTS {
        return Err(ValidationError::TooFewParticipants(names.len()));
    }
    if names.len() > MAX_PARTICIPANTS {
        return Err(ValidationError::TooManyParticipants(names.len()));
    }

    let mut seen = HashSet::new();
    for name in &names {
        if !seen.insert(name.to_lowercase()) {
            return Err(ValidationError::DuplicateParticipant(name.clone()));
        }
    }

    Ok(names)
}

/// Check a fund before it is created.
pub fn fund_setup(trip: &Trip) -> Result<(), ValidationError> {
    for name in &trip.participants {
        if trip.contribution(name).is_negative() {
            return Err(ValidationError::NegativeContribution(name.clone()));
        }
    }
    if !trip.total_pooled.is_positive() {
        return Err(ValidationError::EmptyFund);
    }
    Ok(())
}

/// Equal-division mode: split `total` evenly across participants.
///
/// The last participant absorbs the sub-unit remainder so contributions add
/// up to `total` exactly.
pub fn equal_contributions(participants: &[String], total: Amount) -> HashMap<String, Amount> {
    let Some(n) = i64::try_from(participants.len()).ok().filter(|n| *n > 0) else {
        return HashMap::new();
    };

    let each = total.scaled() / n;
    let remainder = total.scaled() - each * n;
    participants
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let extra = if idx == participants.len() - 1 { remainder } else { 0 };
            (name.clone(), Amount::from_scaled(each + extra))
        })
        .collect()
}

/// An expense as entered by a user, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub id: ExpenseId,
    pub title: String,
    pub amount: Amount,
    /// Selected payer; required unless the fund covers the whole expense.
    pub paid_by: Option<String>,
    pub deduct_from_fund: bool,
    pub created_at: DateTime<Utc>,
}

impl ExpenseDraft {
    /// Validate the draft against the trip and the fund left right now.
    ///
    /// An expense the fund can fully cover is recorded as paid by the pool,
    /// whoever was selected.
    pub fn resolve(self, trip: &Trip, fund_remaining: Amount) -> Result<Expense, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if !self.amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount(self.amount));
        }

        let selected = self
            .paid_by
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(PaidBy::from)
            .and_then(|paid_by| paid_by.participant().map(str::to_string));

        let paid_by = if self.deduct_from_fund && fund_remaining >= self.amount {
            PaidBy::PoolFund
        } else {
            match selected {
                Some(name) if !trip.is_participant(&name) => {
                    return Err(ValidationError::UnknownParticipant(name));
                }
                Some(name) => PaidBy::Participant(name),
                None if self.deduct_from_fund => {
                    return Err(ValidationError::FundShortfall {
                        available: fund_remaining,
                        remaining: self.amount - fund_remaining,
                    });
                }
                None => return Err(ValidationError::MissingPayer),
            }
        };

        Ok(Expense {
            id: self.id,
            title: title.to_string(),
            amount: self.amount,
            paid_by,
            deduct_from_fund: self.deduct_from_fund,
            created_at: self.created_at,
        })
    }
}
