//! Ledger engine.
//!
//! Walks a trip's expenses in chronological order against the pooled fund and
//! derives per-participant balances, pending reimbursements and settlement
//! instructions. The walk is path-dependent: whether the fund still covers an
//! expense depends on every expense before it, so the ledger is always
//! recomputed from the full snapshot.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::Amount;
use crate::model::{Acknowledgements, Expense, PaidBy, Trip, TripSnapshot};

mod error;
pub use error::LedgerError;

mod reimbursement;
use reimbursement::ReimbursementLedger;

mod report;
pub use report::{
    ExpenseOutcome, LedgerReport, ParticipantBalance, Reimbursement, Settlement, SettlementStatus,
};

mod settlement;

mod state;
use state::{ParticipantAccount, Parts};

/// Compute the ledger of a trip snapshot.
///
/// The snapshot is checked up front; once the walk starts nothing can fail.
///
/// # Panics
///
/// If the trip has no participants.
pub fn compute(
    snapshot: TripSnapshot<'_>,
    acks: &Acknowledgements,
) -> Result<LedgerReport, LedgerError> {
    snapshot.validate()?;

    let mut engine = Engine::new(snapshot.trip);
    for expense in snapshot.expenses {
        engine.apply(expense);
    }
    Ok(engine.finish(acks))
}

impl TripSnapshot<'_> {
    /// Check the preconditions of the fund walk.
    pub fn validate(&self) -> Result<(), LedgerError> {
        let trip = self.trip;

        let mut seen = HashSet::new();
        for name in &trip.participants {
            if !seen.insert(name.as_str()) {
                return Err(LedgerError::DuplicateParticipant(name.clone()));
            }
        }

        // Sorted so the reported error does not depend on hash order
        let mut contributions: Vec<_> = trip.contributions.iter().collect();
        contributions.sort_by(|a, b| a.0.cmp(b.0));
        for (name, amount) in contributions {
            if !seen.contains(name.as_str()) {
                return Err(LedgerError::UnknownContributor(name.clone()));
            }
            if amount.is_negative() {
                return Err(LedgerError::NegativeContribution(name.clone(), *amount));
            }
        }

        if trip.total_pooled.is_negative() {
            return Err(LedgerError::NegativePool(trip.total_pooled));
        }

        let mut ids = HashSet::new();
        for expense in self.expenses {
            if !ids.insert(expense.id.as_str()) {
                return Err(LedgerError::DuplicateExpenseId(expense.id.clone()));
            }
            if !expense.amount.is_positive() {
                return Err(LedgerError::NonPositiveAmount(
                    expense.id.clone(),
                    expense.amount,
                ));
            }
            match &expense.paid_by {
                PaidBy::Participant(name) if !seen.contains(name.as_str()) => {
                    return Err(LedgerError::UnknownPayer(expense.id.clone(), name.clone()));
                }
                PaidBy::PoolFund if !expense.deduct_from_fund => {
                    return Err(LedgerError::MissingPayer(expense.id.clone()));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// State of one fund walk.
///
/// Feed expenses through [`Engine::apply`] in chronological order, then call
/// [`Engine::finish`].
pub struct Engine<'a> {
    trip: &'a Trip,
    /// Parallel to `trip.participants`
    accounts: Vec<ParticipantAccount>,
    index: HashMap<&'a str, usize>,
    running_fund: Amount,
    total_expenses: Amount,
    deducted_from_fund: Amount,
    reimbursements: ReimbursementLedger,
    outcomes: Vec<ExpenseOutcome>,
}

/// Public API
impl<'a> Engine<'a> {
    /// Seed every participant's balance with their contribution.
    ///
    /// # Panics
    ///
    /// If the trip has no participants: every share divides by their count.
    pub fn new(trip: &'a Trip) -> Self {
        assert!(
            !trip.participants.is_empty(),
            "a trip needs at least one participant"
        );

        Self {
            trip,
            accounts: trip
                .participants
                .iter()
                .map(|name| ParticipantAccount::new(trip.contribution(name)))
                .collect(),
            index: trip
                .participants
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.as_str(), idx))
                .collect(),
            running_fund: trip.total_pooled,
            total_expenses: Amount::ZERO,
            deducted_from_fund: Amount::ZERO,
            reimbursements: ReimbursementLedger::default(),
            outcomes: Vec::new(),
        }
    }

    /// What is left in the pooled fund so far.
    pub fn fund_remaining(&self) -> Amount {
        self.running_fund
    }

    /// Apply the next expense in chronological order.
    pub fn apply(&mut self, expense: &Expense) -> &ExpenseOutcome {
        let payer = expense
            .paid_by
            .participant()
            .and_then(|name| self.index.get(name).copied());

        let outcome = if expense.deduct_from_fund {
            self.deducted_from_fund += expense.amount;
            self.apply_from_fund(expense, payer)
        } else {
            self.apply_direct(expense, payer)
        };
        self.total_expenses += expense.amount;

        debug!(
            expense = %outcome.id,
            amount = %expense.amount,
            from_fund = %outcome.from_fund,
            fronted = %outcome.fronted,
            fund_remaining = %self.running_fund,
            "expense applied"
        );

        self.outcomes.push(outcome);
        &self.outcomes[self.outcomes.len() - 1]
    }

    /// Round every account and derive reimbursements and settlements.
    pub fn finish(self, acks: &Acknowledgements) -> LedgerReport {
        let n = self.len();
        let names = &self.trip.participants;

        let participants: Vec<ParticipantBalance> = names
            .iter()
            .zip(&self.accounts)
            .map(|(name, account)| ParticipantBalance {
                name: name.clone(),
                contribution: account.contribution,
                extra_paid: account.extra_paid,
                expense_share: account.expense_share.round_to_cent(n),
                balance: account.balance(n).round_to_cent(n),
            })
            .collect();

        let balances: Vec<(&str, Amount)> = participants
            .iter()
            .map(|p| (p.name.as_str(), p.balance))
            .collect();
        let settlements = settlement::derive(&balances, acks);

        LedgerReport {
            total_pooled: self.trip.total_pooled,
            total_expenses: self.total_expenses,
            deducted_from_fund: self.deducted_from_fund,
            fund_remaining: self.running_fund,
            reimbursements: self.reimbursements.into_report(names, acks),
            participants,
            expenses: self.outcomes,
            settlements,
        }
    }
}

/// Private API
impl Engine<'_> {
    fn len(&self) -> usize {
        self.accounts.len()
    }

    fn charge_all(&mut self, share: Parts) {
        for account in &mut self.accounts {
            account.charge(share);
        }
    }

    /// `payer` fronted `amount`; everyone else owes them an equal share of it.
    fn front(&mut self, payer: usize, amount: Amount) {
        let share = Parts::share(amount);
        self.accounts[payer].credit(amount);
        for debtor in (0..self.len()).filter(|&idx| idx != payer) {
            self.reimbursements.record(payer, debtor, share);
        }
    }

    /// Expense paid out of the pool:
    /// - Fund covers it: draw it and charge everyone an equal share
    /// - Shortfall: drain the fund and charge everyone a share of the covered part,
    ///   the payer fronts the rest and every other participant owes them a share of it
    fn apply_from_fund(&mut self, expense: &Expense, payer: Option<usize>) -> ExpenseOutcome {
        let n = self.len();
        let mut outcome = ExpenseOutcome {
            id: expense.id.clone(),
            per_person_share: Parts::share(expense.amount).round_to_cent(n),
            from_fund: Amount::ZERO,
            fronted: Amount::ZERO,
            unattributed: Amount::ZERO,
        };

        if self.running_fund >= expense.amount {
            self.running_fund -= expense.amount;
            self.charge_all(Parts::share(expense.amount));
            outcome.from_fund = expense.amount;
            return outcome;
        }

        let covered = self.running_fund;
        let uncovered = expense.amount - covered;
        self.running_fund = Amount::ZERO;
        self.charge_all(Parts::share(covered));
        outcome.from_fund = covered;

        match payer {
            Some(payer) => {
                let share = Parts::share(uncovered);
                for (idx, account) in self.accounts.iter_mut().enumerate() {
                    if idx != payer {
                        account.charge(share);
                    }
                }
                self.front(payer, uncovered);
                outcome.fronted = uncovered;
            }
            None => {
                warn!(
                    expense = %expense.id,
                    paid_by = %expense.paid_by,
                    uncovered = %uncovered,
                    "fund shortfall has no designated payer"
                );
                outcome.unattributed = uncovered;
            }
        }

        outcome
    }

    /// Expense paid directly by a participant: credit them the full amount and
    /// charge everyone (payer included) an equal share.
    fn apply_direct(&mut self, expense: &Expense, payer: Option<usize>) -> ExpenseOutcome {
        let n = self.len();
        let share = Parts::share(expense.amount);
        let mut outcome = ExpenseOutcome {
            id: expense.id.clone(),
            per_person_share: share.round_to_cent(n),
            from_fund: Amount::ZERO,
            fronted: Amount::ZERO,
            unattributed: Amount::ZERO,
        };

        self.charge_all(share);
        match payer {
            Some(payer) => {
                self.front(payer, expense.amount);
                outcome.fronted = expense.amount;
            }
            None => {
                warn!(
                    expense = %expense.id,
                    paid_by = %expense.paid_by,
                    "direct expense has no participant payer"
                );
                outcome.unattributed = expense.amount;
            }
        }

        outcome
    }
}
