//! Core domain types for the trip ledger.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Amount;

/// Expense identifier, assigned by the trip store.
pub type ExpenseId = String;

/// Payer sentinel for expenses settled entirely out of the pooled fund.
pub const POOL_FUND: &str = "Pool Fund";

/// Who paid for an expense.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaidBy {
    /// Paid out of the pooled fund, nobody fronted cash.
    PoolFund,
    /// Paid (fully or the uncovered part) by a participant.
    Participant(String),
}

impl PaidBy {
    pub fn participant(&self) -> Option<&str> {
        match self {
            PaidBy::PoolFund => None,
            PaidBy::Participant(name) => Some(name),
        }
    }
}

impl From<String> for PaidBy {
    fn from(value: String) -> Self {
        if value == POOL_FUND {
            PaidBy::PoolFund
        } else {
            PaidBy::Participant(value)
        }
    }
}

impl From<&str> for PaidBy {
    fn from(value: &str) -> Self {
        PaidBy::from(value.to_string())
    }
}

impl From<PaidBy> for String {
    fn from(value: PaidBy) -> Self {
        match value {
            PaidBy::PoolFund => POOL_FUND.to_string(),
            PaidBy::Participant(name) => name,
        }
    }
}

impl fmt::Display for PaidBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaidBy::PoolFund => f.write_str(POOL_FUND),
            PaidBy::Participant(name) => f.write_str(name),
        }
    }
}

/// A logged trip expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub title: String,
    pub amount: Amount,
    pub paid_by: PaidBy,
    /// Pay from the pooled fund first; a shortfall falls on `paid_by`.
    pub deduct_from_fund: bool,
    pub created_at: DateTime<Utc>,
}

/// Fund setup of a trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Display and iteration order.
    pub participants: Vec<String>,
    pub contributions: HashMap<String, Amount>,
    /// Starting balance of the fund, fixed once expenses accrue against it.
    pub total_pooled: Amount,
}

impl Trip {
    /// Build a trip whose pooled total is the sum of the given contributions.
    pub fn pooled(contributions: impl IntoIterator<Item = (String, Amount)>) -> Self {
        let mut trip = Trip::default();
        for (name, amount) in contributions {
            trip.participants.push(name.clone());
            trip.contributions.insert(name, amount);
        }
        trip.total_pooled = trip.contributions.values().sum();
        trip
    }

    pub fn contribution(&self, name: &str) -> Amount {
        self.contributions.get(name).copied().unwrap_or_default()
    }

    pub fn is_participant(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p == name)
    }
}

/// The immutable input of one ledger computation.
#[derive(Debug, Clone, Copy)]
pub struct TripSnapshot<'a> {
    pub trip: &'a Trip,
    /// Full expense list in chronological order.
    pub expenses: &'a [Expense],
}

impl<'a> TripSnapshot<'a> {
    pub fn new(trip: &'a Trip, expenses: &'a [Expense]) -> Self {
        Self { trip, expenses }
    }
}

/// Manually confirmed reimbursements, keyed payer -> debtor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Acknowledgements(HashMap<String, HashMap<String, bool>>);

impl Acknowledgements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `payer` received what `debtor` owed. Entries are never reset.
    pub fn mark_received(&mut self, payer: &str, debtor: &str) {
        self.0
            .entry(payer.to_string())
            .or_default()
            .insert(debtor.to_string(), true);
    }

    pub fn is_received(&self, payer: &str, debtor: &str) -> bool {
        self.0
            .get(payer)
            .and_then(|debtors| debtors.get(debtor))
            .copied()
            .unwrap_or(false)
    }
}
