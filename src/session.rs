//! Trip session: applies user mutations to a store and recomputes the ledger.
//!
//! Every command is validated against a ledger computed from the current store
//! contents. The ledger itself is never cached: [`TripSession::report`] walks
//! the full expense history each time.

use thiserror::Error;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::engine::{self, Engine, LedgerError, LedgerReport};
use crate::model::ExpenseId;
use crate::store::{StoreError, TripStore};
use crate::validate::{ExpenseDraft, ValidationError};

/// A user mutation of a trip.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddExpense(ExpenseDraft),
    DeleteExpense(ExpenseId),
    /// `payer` confirms `debtor` paid back what they owed.
    MarkReceived { payer: String, debtor: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("no pending reimbursement from {debtor} to {payer}")]
    NoReimbursement { payer: String, debtor: String },
}

/// Owns a trip store and mediates every change to it.
pub struct TripSession<S> {
    store: S,
}

/// Public API
impl<S: TripStore> TripSession<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Recompute the ledger from the full store contents.
    pub fn report(&self) -> Result<LedgerReport, LedgerError> {
        engine::compute(self.store.snapshot(), self.store.acknowledgements())
    }

    /// Run the session over the given command stream
    pub async fn run(&mut self, mut stream: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = stream.next().await {
            // a rejected command must not stop the session
            let _ = self.apply(command);
        }
    }

    /// Apply a single command on top of the current trip state
    pub fn apply(&mut self, command: Command) -> Result<(), SessionError> {
        match command {
            Command::AddExpense(draft) => {
                let id = draft.id.clone();
                let result = self.add_expense(draft);
                Self::log_result("add expense", &id, &result);
                result
            }
            Command::DeleteExpense(id) => {
                let result = self.store.delete_expense(&id).map(drop).map_err(Into::into);
                Self::log_result("delete expense", &id, &result);
                result
            }
            Command::MarkReceived { payer, debtor } => {
                let result = self.mark_received(&payer, &debtor);
                Self::log_result("mark received", &format!("{debtor} -> {payer}"), &result);
                result
            }
        }
    }
}

/// Private API
impl<S: TripStore> TripSession<S> {
    fn log_result(command: &str, subject: &str, result: &Result<(), SessionError>) {
        match result {
            Ok(()) => info!(subject, "{command} applied"),
            Err(e) => warn!(subject, reason = %e, "{command} skipped"),
        }
    }

    /// Validate the draft against the fund left at its place in the timeline,
    /// then make sure every later fund expense is still paid for.
    fn add_expense(&mut self, draft: ExpenseDraft) -> Result<(), SessionError> {
        let snapshot = self.store.snapshot();
        snapshot.validate()?;

        // same slot the store will insert into
        let at = snapshot
            .expenses
            .partition_point(|e| e.created_at <= draft.created_at);
        let (earlier, later) = snapshot.expenses.split_at(at);

        let mut engine = Engine::new(snapshot.trip);
        for expense in earlier {
            engine.apply(expense);
        }
        let expense = draft.resolve(snapshot.trip, engine.fund_remaining())?;

        engine.apply(&expense);
        for next in later {
            let outcome = engine.apply(next);
            if outcome.unattributed.is_positive() {
                return Err(ValidationError::LaterShortfall {
                    expense: outcome.id.clone(),
                    remaining: outcome.unattributed,
                }
                .into());
            }
        }

        self.store.insert_expense(expense)?;
        Ok(())
    }

    /// Only an existing reimbursement can be acknowledged.
    fn mark_received(&mut self, payer: &str, debtor: &str) -> Result<(), SessionError> {
        let report = self.report()?;
        if report.reimbursement(payer, debtor).is_none() {
            return Err(SessionError::NoReimbursement {
                payer: payer.to_string(),
                debtor: debtor.to_string(),
            });
        }
        self.store.mark_received(payer, debtor);
        Ok(())
    }
}
