//! Trip store boundary.
//!
//! The ledger only needs one trip at a time: its fund setup, its expenses in
//! creation order and the acknowledgement map. Where those records live is up
//! to the implementation.

use thiserror::Error;

use crate::model::{Acknowledgements, Expense, ExpenseId, Trip, TripSnapshot};

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("expense {0} already exists")]
    DuplicateExpense(ExpenseId),

    #[error("expense {0} not found")]
    ExpenseNotFound(ExpenseId),
}

pub trait TripStore {
    fn trip(&self) -> &Trip;

    /// All expenses, oldest first.
    fn expenses(&self) -> &[Expense];

    fn insert_expense(&mut self, expense: Expense) -> Result<(), StoreError>;

    fn delete_expense(&mut self, id: &str) -> Result<Expense, StoreError>;

    fn acknowledgements(&self) -> &Acknowledgements;

    fn mark_received(&mut self, payer: &str, debtor: &str);

    fn snapshot(&self) -> TripSnapshot<'_> {
        TripSnapshot::new(self.trip(), self.expenses())
    }
}

/// Keeps one trip in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    trip: Trip,
    /// Sorted by `created_at`, ties in insertion order
    expenses: Vec<Expense>,
    acks: Acknowledgements,
}

impl MemoryStore {
    pub fn new(trip: Trip) -> Self {
        Self {
            trip,
            expenses: Vec::new(),
            acks: Acknowledgements::new(),
        }
    }
}

impl TripStore for MemoryStore {
    fn trip(&self) -> &Trip {
        &self.trip
    }

    fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    fn insert_expense(&mut self, expense: Expense) -> Result<(), StoreError> {
        if self.expenses.iter().any(|e| e.id == expense.id) {
            return Err(StoreError::DuplicateExpense(expense.id));
        }
        let at = self
            .expenses
            .partition_point(|e| e.created_at <= expense.created_at);
        self.expenses.insert(at, expense);
        Ok(())
    }

    fn delete_expense(&mut self, id: &str) -> Result<Expense, StoreError> {
        let idx = self
            .expenses
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StoreError::ExpenseNotFound(id.to_string()))?;
        Ok(self.expenses.remove(idx))
    }

    fn acknowledgements(&self) -> &Acknowledgements {
        &self.acks
    }

    fn mark_received(&mut self, payer: &str, debtor: &str) {
        self.acks.mark_received(payer, debtor);
    }
}
